//! REST API endpoint handlers
//!
//! Handlers only read shared state. The one endpoint that fetches a fresh
//! quote asks the ingestion loop to do it.

use crate::api::types::*;
use crate::error::AppError;
use crate::scheduler::IngestionTrigger;
use crate::services::PriceService;
use crate::state::AppState;
use axum::{
    extract::{Json, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state for API handlers
pub struct ApiState {
    pub app: Arc<AppState>,
    pub ingestion: IngestionTrigger,
}

impl ApiState {
    pub fn new(app: Arc<AppState>, ingestion: IngestionTrigger) -> Self {
        Self { app, ingestion }
    }
}

fn error_response(status: StatusCode, err: &AppError) -> Response {
    (status, Json(ErrorBody::from(err))).into_response()
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health or GET /
pub async fn health_check(AxumState(state): AxumState<Arc<ApiState>>) -> impl IntoResponse {
    let app = &state.app;
    let degraded = app.is_storage_degraded();

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        storage_degraded: degraded,
        phase: app.phase(),
        history_length: app.history_len(),
        history_capacity: app.config.history_capacity,
        forecast_enabled: app.config.forecast_enabled,
        last_tick: app.last_tick(),
    })
}

// ============================================================================
// Prices
// ============================================================================

/// GET /api/current-price
///
/// Fetch failures are reported in the body with a 200 status.
pub async fn current_price(AxumState(state): AxumState<Arc<ApiState>>) -> Response {
    match state.ingestion.fetch_now().await {
        Ok(reading) => Json(reading).into_response(),
        Err(e) => {
            warn!("On-demand fetch failed: {}", e);
            Json(ErrorBody::from(&e)).into_response()
        }
    }
}

/// GET /api/predicted-price
pub async fn predicted_price(AxumState(state): AxumState<Arc<ApiState>>) -> impl IntoResponse {
    Json(PredictedPriceResponse {
        predicted_price: PriceService::predicted_price(&state.app),
    })
}

/// GET /api/price-history
pub async fn price_history(AxumState(state): AxumState<Arc<ApiState>>) -> impl IntoResponse {
    Json(PriceService::history(&state.app))
}

/// GET /api/dashboard-data
pub async fn dashboard_data(AxumState(state): AxumState<Arc<ApiState>>) -> impl IntoResponse {
    Json(PriceService::dashboard(&state.app))
}

/// GET /api/last-prices?count={10|50|100|1000}
pub async fn last_prices(
    AxumState(state): AxumState<Arc<ApiState>>,
    Query(query): Query<LastPricesQuery>,
) -> Response {
    match PriceService::last_prices(&state.app, query.count.as_deref()) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) if e.is_storage_failure() => {
            error!("Failed to read price log: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
        Err(e @ AppError::Validation(_)) => error_response(StatusCode::BAD_REQUEST, &e),
        Err(e) => {
            error!("Unexpected error reading last prices: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}
