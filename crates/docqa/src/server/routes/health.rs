//! Liveness and readiness endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::server::state::AppState;
use crate::types::HealthResponse;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// GET /ready - 503 until the vector store answers
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    if state.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
