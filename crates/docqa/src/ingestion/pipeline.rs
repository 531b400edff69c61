//! Ingestion pipeline orchestration: load, chunk, store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::VectorStoreProvider;
use crate::types::Chunk;

use super::chunker::SemanticChunker;
use super::loader::DocumentLoader;

/// Main ingestion pipeline
pub struct IngestPipeline {
    loader: Arc<DocumentLoader>,
    chunker: SemanticChunker,
    store: Arc<dyn VectorStoreProvider>,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        loader: Arc<DocumentLoader>,
        chunker: SemanticChunker,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            loader,
            chunker,
            store,
        }
    }

    /// Load and chunk a file without storing it
    pub async fn chunk_file(&self, path: &Path, source: &str) -> Result<Vec<Chunk>> {
        let loader = Arc::clone(&self.loader);
        let owned_path = path.to_path_buf();
        let owned_source = source.to_string();

        let units = tokio::task::spawn_blocking(move || loader.load(&owned_path, &owned_source))
            .await
            .map_err(|e| Error::internal(format!("Loader task failed: {}", e)))??;
        tracing::info!("Loaded {} units from {}", units.len(), source);

        self.chunker.split_units(&units).await
    }

    /// Full ingestion: load + chunk + store. Returns the number of chunks stored.
    ///
    /// `source` is the name recorded with every chunk (the uploaded filename).
    /// The collection is ensured first so the store never infers its own schema.
    pub async fn ingest_file(&self, path: &Path, source: &str) -> Result<usize> {
        if self.store.ensure_collection(self.store.collection()).await? {
            tracing::info!("Created collection {}", self.store.collection());
        }

        let chunks = self.chunk_file(path, source).await?;
        if chunks.is_empty() {
            return Err(Error::file_parse(source, "no text could be extracted"));
        }

        let stored = self.store.add(chunks).await?;
        tracing::info!("Indexed {} chunks from {}", stored, source);
        Ok(stored)
    }

    /// Ingest a file under its own filename
    pub async fn ingest_path(&self, path: &Path) -> Result<usize> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest_file(path, &source).await
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }
}

/// Supported documents under `paths`; directories are walked recursively
pub fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                walkdir::WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|p| crate::types::FileType::from_path(p).is_supported()),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}
