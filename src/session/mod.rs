pub mod claims;
pub mod cookies;

pub use claims::{decode_claims, Claims};
pub use cookies::{clear_session, session_cookies, store_session};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// Access token issued during this request by the refresh layer
#[derive(Debug, Clone)]
struct RefreshedToken(String);

/// Keeps `/api` sessions alive.
///
/// With an access cookie the request passes straight through. Without one,
/// a present refresh cookie buys exactly one refresh attempt; the new pair
/// is written back as cookies and handed to the handler. With neither the
/// request is rejected.
pub async fn refresh_session(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let config = &state.config;

    if cookies::access_token(config, &jar).is_some() {
        return next.run(request).await;
    }

    let Some(refresh_token) = cookies::refresh_token(config, &jar) else {
        debug!("No session cookies on {}", request.uri().path());
        return AppError::Unauthenticated.into_response();
    };

    match state.backend.refresh(&refresh_token).await {
        Ok(pair) => {
            info!("Session refreshed");
            request
                .extensions_mut()
                .insert(RefreshedToken(pair.access_token.clone()));
            let jar = store_session(config, jar, &pair);
            (jar, next.run(request).await).into_response()
        }
        Err(err @ (AppError::Unauthenticated | AppError::Forbidden | AppError::BadRequest(_))) => {
            warn!("Refresh rejected: {err}");
            (clear_session(config, jar), AppError::Unauthenticated).into_response()
        }
        // Backend trouble says nothing about the refresh token, so it stays.
        Err(err) => err.into_response(),
    }
}

/// Access token for the current request
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn claims(&self) -> Option<Claims> {
        decode_claims(&self.0)
    }

    /// Reject early when the token names a role that fails `allowed`.
    ///
    /// Tokens without a readable role are let through for the backend to judge.
    pub fn require_role(&self, allowed: impl Fn(Role) -> bool) -> Result<(), AppError> {
        match self.claims().and_then(|claims| claims.role) {
            Some(role) if !allowed(role) => Err(AppError::Forbidden),
            _ => Ok(()),
        }
    }
}

impl FromRequestParts<SharedState> for SessionToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        if let Some(RefreshedToken(token)) = parts.extensions.get::<RefreshedToken>() {
            return Ok(SessionToken(token.clone()));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        cookies::access_token(&state.config, &jar)
            .map(SessionToken)
            .ok_or(AppError::Unauthenticated)
    }
}
