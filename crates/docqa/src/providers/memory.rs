//! In-memory vector store using cosine distance.
//!
//! Records live in a `HashMap` of collections behind a `tokio::sync::RwLock`.
//! Nothing survives a restart; use it for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::embedding::{cosine_similarity, EmbeddingProvider};
use super::vector_store::VectorStoreProvider;
use crate::error::{Error, Result};
use crate::types::{Chunk, StoredRecord};

struct Entry {
    record: StoredRecord,
    vector: Vec<f32>,
}

/// Process-local vector store
pub struct InMemoryVectorStore {
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Vec<Entry>>>,
    closed: AtomicBool,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collection: collection.into(),
            embedder,
            collections: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::vector_db("store is closed"));
        }
        Ok(())
    }

    /// Number of collections created so far
    pub async fn collection_count(&self) -> usize {
        self.collections.read().await.len()
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str) -> Result<bool> {
        self.check_open()?;
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Ok(false);
        }
        collections.insert(name.to_string(), Vec::new());
        tracing::info!("Created in-memory collection {}", name);
        Ok(true)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.check_open()?;
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize> {
        self.check_open()?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut collections = self.collections.write().await;
        let entries = collections.entry(self.collection.clone()).or_default();
        let added = chunks.len();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            entries.push(Entry {
                record: StoredRecord {
                    content: chunk.content,
                    source: chunk.metadata.source,
                    page: chunk.metadata.page,
                    distance: None,
                },
                vector,
            });
        }
        Ok(added)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<StoredRecord>> {
        self.check_open()?;
        let query_vector = self.embedder.embed(query).await?;

        let collections = self.collections.read().await;
        let Some(entries) = collections.get(&self.collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<StoredRecord> = entries
            .iter()
            .map(|entry| StoredRecord {
                distance: Some(1.0 - cosine_similarity(&query_vector, &entry.vector)),
                ..entry.record.clone()
            })
            .collect();
        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        self.check_open()?;
        let collections = self.collections.read().await;
        Ok(collections.get(&self.collection).map_or(0, Vec::len))
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        self.check_open()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&self.collection)
            .map(|entries| entries.iter().take(limit).map(|e| e.record.clone()).collect())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.closed.load(Ordering::SeqCst))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
