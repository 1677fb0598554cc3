use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::backend::ForwardRequest;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{Property, Reservation};
use crate::routes::{list_page, ListPage};
use crate::routes::properties::fetch_property;
use crate::session::SessionToken;
use crate::state::SharedState;
use crate::stats::{self as figures, MonthlySales, PerformanceSummary, PriceTrend};

const DEFAULT_TREND_WINDOW: usize = 3;

/// Fetch listings and reservations side by side
async fn fetch_dataset(
    state: &SharedState,
    token: &SessionToken,
) -> Result<(Vec<Property>, Vec<Reservation>), AppError> {
    let (properties, reservations) = tokio::try_join!(
        state
            .backend
            .forward(ForwardRequest::get("/properties").bearer(token.0.clone())),
        state
            .backend
            .forward(ForwardRequest::get("/reservations").bearer(token.0.clone())),
    )?;

    let properties = page_items("/properties", list_page(properties)?);
    let reservations = page_items("/reservations", list_page(reservations)?);
    Ok((properties, reservations))
}

/// Figures only cover what the backend sent; say so when that is a partial page
fn page_items<T>(path: &str, page: ListPage<T>) -> Vec<T> {
    if page.is_truncated() {
        warn!(
            "{path} returned {} of {} items; statistics cover the received page only",
            page.items.len(),
            page.total.unwrap_or_default()
        );
    }
    page.items
}

/// GET /api/stats/performance
pub async fn performance(
    State(state): State<SharedState>,
    token: SessionToken,
) -> Result<Json<PerformanceSummary>, AppError> {
    let (properties, reservations) = fetch_dataset(&state, &token).await?;
    Ok(Json(figures::performance(&properties, &reservations, Utc::now())))
}

/// GET /api/stats/monthly
pub async fn monthly(
    State(state): State<SharedState>,
    token: SessionToken,
) -> Result<Json<Vec<MonthlySales>>, AppError> {
    let (properties, reservations) = fetch_dataset(&state, &token).await?;
    Ok(Json(figures::monthly_sales(&properties, &reservations)))
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    window: Option<usize>,
}

/// GET /api/stats/properties/{id}/trend
pub async fn price_trend(
    State(state): State<SharedState>,
    token: SessionToken,
    Path(id): Path<i64>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<PriceTrend>, AppError> {
    let property = fetch_property(&state, &token, id).await?;
    let window = query.window.unwrap_or(DEFAULT_TREND_WINDOW);
    Ok(Json(figures::price_trend(&property, window)))
}
