//! Document QA API server
//!
//! Run with: cargo run -p docqa --bin docqa-server [-- <config.toml>]

use std::path::PathBuf;

use docqa::{config::DocQaConfig, server::DocQaServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DocQaConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embeddings: {:?} ({})", config.embeddings.backend, config.embeddings.model);
    tracing::info!("  - Vector store: {:?} at {}", config.vector_db.backend, config.vector_db.url);
    tracing::info!("  - Collection: {}", config.vector_db.collection);
    tracing::info!("  - Ollama: {} (default model {})", config.llm.base_url, config.llm.default_model);

    let server = DocQaServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /index_pdf - Upload a PDF or PowerPoint file");
    println!("  POST /predict   - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
