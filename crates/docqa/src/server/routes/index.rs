//! Document upload and indexing endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::Path;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IndexResponse;

/// Multipart field carrying the document
pub const UPLOAD_FIELD: &str = "pdf_file";

/// POST /index_pdf - load, chunk and store one uploaded document.
///
/// Always answers 200; failures are reported in the body.
pub async fn index_pdf(State(state): State<AppState>, mut multipart: Multipart) -> Json<IndexResponse> {
    let start = Instant::now();

    match ingest_upload(&state, &mut multipart).await {
        Ok((filename, chunks)) => {
            tracing::info!(
                "Indexed {} ({} chunks) in {}ms",
                filename,
                chunks,
                start.elapsed().as_millis()
            );
            Json(IndexResponse::Indexed)
        }
        Err(e) => {
            tracing::error!("Indexing failed: {}", e);
            Json(IndexResponse::Error {
                message: e.to_string(),
            })
        }
    }
}

async fn ingest_upload(state: &AppState, multipart: &mut Multipart) -> Result<(String, usize)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::file_parse(&filename, format!("Failed to read upload: {}", e)))?;

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        // Keep the extension so the loader can dispatch on it
        let suffix = Path::new(&filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix("docqa-")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(temp.path(), &data).await?;

        let chunks = state.pipeline().ingest_file(temp.path(), &filename).await?;
        return Ok((filename, chunks));
    }

    Err(Error::Internal(format!(
        "No file found in multipart field '{}'",
        UPLOAD_FIELD
    )))
}
