//! API routes

pub mod health;
pub mod index;
pub mod predict;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        // Larger body limit for document uploads
        .route(
            "/index_pdf",
            post(index::index_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/predict", post(predict::predict))
}
