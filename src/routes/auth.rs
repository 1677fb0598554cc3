use axum::{extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::AppError;
use crate::extract::Json;
use crate::models::{LoginRequest, RegisterRequest};
use crate::session::{clear_session, cookies, decode_claims, store_session};
use crate::state::SharedState;

/// POST /api/auth/login
/// Tokens go into cookies only; the body carries what the UI may show.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(credentials): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let pair = state.backend.login(&credentials).await?;
    let claims = decode_claims(&pair.access_token).unwrap_or_default();

    info!("User {} logged in", credentials.email);

    let jar = store_session(&state.config, jar, &pair);
    Ok((jar, Json(json!({ "user": claims }))))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<SharedState>,
    Json(account): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let created = state.backend.register(&account).await?;
    info!("Registered {} as {:?}", account.email, account.role);
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/auth/logout
/// Cookies are cleared even when the backend call fails.
pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    if let Some(token) = cookies::access_token(&state.config, &jar) {
        if let Err(e) = state.backend.logout(&token).await {
            warn!("Backend logout failed: {e}");
        }
    }

    (clear_session(&state.config, jar), Json(json!({ "ok": true })))
}

/// GET /api/auth/session
/// Answers from cookies alone, without a backend round trip.
pub async fn session(State(state): State<SharedState>, jar: CookieJar) -> Json<Value> {
    let config = &state.config;
    let access = cookies::access_token(config, &jar);
    let claims = access.as_deref().and_then(decode_claims);
    let expired = claims
        .as_ref()
        .is_some_and(|c| c.is_expired(Utc::now().timestamp()));
    let refreshable = cookies::refresh_token(config, &jar).is_some();

    Json(json!({
        "authenticated": (access.is_some() && !expired) || refreshable,
        "refreshable": refreshable,
        "sub": claims.as_ref().and_then(|c| c.sub.clone()),
        "role": claims.and_then(|c| c.role),
    }))
}
