use axum::{
    extract::State,
    http::{Method, StatusCode},
};
use serde_json::Value;
use tracing::info;

use crate::backend::ForwardRequest;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{NewReservation, ReservationStatusUpdate, Role};
use crate::session::SessionToken;
use crate::state::SharedState;

/// GET /api/reservations
pub async fn list_reservations(
    State(state): State<SharedState>,
    token: SessionToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, AppError> {
    let request = ForwardRequest::get("/reservations").bearer(token.0).query(params);
    Ok(Json(state.backend.forward(request).await?))
}

/// GET /api/reservations/{id}
pub async fn get_reservation(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let request = ForwardRequest::get(format!("/reservations/{id}")).bearer(token.0);
    Ok(Json(state.backend.forward(request).await?))
}

/// POST /api/reservations
pub async fn create_reservation(
    State(state): State<SharedState>,
    token: SessionToken,
    Json(payload): Json<NewReservation>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    token.require_role(Role::can_reserve)?;

    if !payload.has_valid_window() {
        return Err(AppError::BadRequest(
            "reservation must end after it starts".to_string(),
        ));
    }

    let request = ForwardRequest::new(Method::POST, "/reservations")
        .bearer(token.0)
        .json(&payload)?;
    let created = state.backend.forward(request).await?;

    info!(
        "Reserved property {} for {}",
        payload.property_id, payload.client_name
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/reservations/{id}/status
pub async fn update_reservation_status(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationStatusUpdate>,
) -> Result<Json<Value>, AppError> {
    token.require_role(Role::can_reserve)?;

    let request = ForwardRequest::new(Method::PATCH, format!("/reservations/{id}/status"))
        .bearer(token.0)
        .json(&payload)?;
    let updated = state.backend.forward(request).await?;

    info!("Reservation {id} marked {:?}", payload.status);
    Ok(Json(updated))
}
