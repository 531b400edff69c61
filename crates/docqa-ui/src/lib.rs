//! docqa-ui: a single-page web form over the docqa API
//!
//! Documents are forwarded to `/index_pdf`, questions to `/predict`. The UI
//! keeps no state beyond the form being rendered.

pub mod api_client;
pub mod config;
pub mod pages;
pub mod routes;

pub use api_client::{ApiClient, ApiError, UploadOutcome};
pub use config::UiConfig;
pub use routes::{ui_router, UiState};
