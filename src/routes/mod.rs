use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::refresh_session;
use crate::state::SharedState;

pub mod auth;
pub mod properties;
pub mod reservations;
pub mod stats;

/// All gateway routes; everything but `/api/auth` and `/health` runs behind the session layer
pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route(
            "/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/properties/{id}",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route(
            "/properties/{id}/prices",
            get(properties::price_history).post(properties::add_price),
        )
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route("/reservations/{id}", get(reservations::get_reservation))
        .route(
            "/reservations/{id}/status",
            patch(reservations::update_reservation_status),
        )
        .route("/stats/performance", get(stats::performance))
        .route("/stats/monthly", get(stats::monthly))
        .route("/stats/properties/{id}/trend", get(stats::price_trend))
        .route_layer(middleware::from_fn_with_state(state, refresh_session));

    let auth = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session));

    Router::new()
        .route("/health", get(health))
        .nest("/api", protected.merge(auth))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// One page of a backend list response
#[derive(Debug)]
pub(crate) struct ListPage<T> {
    pub items: Vec<T>,
    /// Total across all pages, when the backend reports one
    pub total: Option<u64>,
}

impl<T> ListPage<T> {
    /// The backend holds more items than this page carries
    pub fn is_truncated(&self) -> bool {
        self.total.is_some_and(|total| total > self.items.len() as u64)
    }
}

/// Parse a backend list response.
///
/// Accepts a bare array or a page object wrapping one under `content`,
/// `items` or `data`, with an optional `totalElements` or `total` count.
pub(crate) fn list_page<T: DeserializeOwned>(value: Value) -> Result<ListPage<T>, AppError> {
    let (items, total) = match value {
        Value::Array(items) => (Value::Array(items), None),
        Value::Object(mut page) => {
            let total = ["totalElements", "total"]
                .iter()
                .find_map(|key| page.get(*key).and_then(Value::as_u64));
            let items = ["content", "items", "data"]
                .iter()
                .find_map(|key| page.remove(*key).filter(Value::is_array))
                .ok_or_else(|| AppError::Backend("list response without items".to_string()))?;
            (items, total)
        }
        Value::Null => return Ok(ListPage { items: Vec::new(), total: None }),
        other => {
            return Err(AppError::Backend(format!("unexpected list response: {other}")));
        }
    };

    let items = serde_json::from_value(items)
        .map_err(|e| AppError::Backend(format!("malformed list item: {e}")))?;
    Ok(ListPage { items, total })
}
