//! docqa web UI
//!
//! Run with: cargo run -p docqa-ui

use std::time::Duration;

use docqa_ui::{ui_router, ApiClient, UiConfig, UiState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_ui=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = UiConfig::from_env();
    let client = ApiClient::new(&config.api_url, Duration::from_secs(config.timeout_secs))?;
    let router = ui_router(UiState::new(client));

    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!("docqa UI on http://{} (API: {})", config.address(), config.api_url);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
