use axum::{
    extract::State,
    http::{Method, StatusCode},
};
use serde_json::Value;
use tracing::info;

use crate::backend::ForwardRequest;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{NewPriceEntry, NewProperty, PriceEntry, Property, PropertyUpdate, Role};
use crate::session::SessionToken;
use crate::state::SharedState;

/// Fetch one property and parse it
pub(crate) async fn fetch_property(
    state: &SharedState,
    token: &SessionToken,
    id: i64,
) -> Result<Property, AppError> {
    let value = state
        .backend
        .forward(ForwardRequest::get(format!("/properties/{id}")).bearer(token.0.clone()))
        .await?;
    serde_json::from_value(value).map_err(|e| AppError::Backend(format!("malformed property: {e}")))
}

/// GET /api/properties
/// Filters, sorting and paging parameters pass through untouched.
pub async fn list_properties(
    State(state): State<SharedState>,
    token: SessionToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, AppError> {
    let request = ForwardRequest::get("/properties").bearer(token.0).query(params);
    Ok(Json(state.backend.forward(request).await?))
}

/// GET /api/properties/{id}
pub async fn get_property(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let request = ForwardRequest::get(format!("/properties/{id}")).bearer(token.0);
    Ok(Json(state.backend.forward(request).await?))
}

/// POST /api/properties
pub async fn create_property(
    State(state): State<SharedState>,
    token: SessionToken,
    Json(payload): Json<NewProperty>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    token.require_role(Role::can_manage_properties)?;

    let request = ForwardRequest::new(Method::POST, "/properties")
        .bearer(token.0)
        .json(&payload)?;
    let created = state.backend.forward(request).await?;

    info!("Created property {}", payload.title);
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/properties/{id}
pub async fn update_property(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
    Json(payload): Json<PropertyUpdate>,
) -> Result<Json<Value>, AppError> {
    token.require_role(Role::can_manage_properties)?;

    let request = ForwardRequest::new(Method::PUT, format!("/properties/{id}"))
        .bearer(token.0)
        .json(&payload)?;
    Ok(Json(state.backend.forward(request).await?))
}

/// DELETE /api/properties/{id}
pub async fn delete_property(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    token.require_role(Role::can_manage_properties)?;

    let request = ForwardRequest::new(Method::DELETE, format!("/properties/{id}")).bearer(token.0);
    state.backend.forward(request).await?;

    info!("Deleted property {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/properties/{id}/prices
/// History comes back oldest first whatever order the backend stored it in.
pub async fn price_history(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PriceEntry>>, AppError> {
    let property = fetch_property(&state, &token, id).await?;
    Ok(Json(property.sorted_history()))
}

/// POST /api/properties/{id}/prices
pub async fn add_price(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
    Json(payload): Json<NewPriceEntry>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    token.require_role(Role::can_manage_properties)?;

    let request = ForwardRequest::new(Method::POST, format!("/properties/{id}/prices"))
        .bearer(token.0)
        .json(&payload)?;
    let created = state.backend.forward(request).await?;

    info!("Repriced property {id} at {}", payload.price);
    Ok((StatusCode::CREATED, Json(created)))
}
