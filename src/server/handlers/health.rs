//! Provider health handler.

use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};

use super::super::types::AppState;

/// `GET /health` - per-provider circuit and rate-limit state.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let status = state.geocoding.get_health_status().await;
    Json(status).into_response()
}
