//! Vector store provider trait for storing and searching chunks

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, StoredRecord};

/// Trait for chunk storage and similarity search
///
/// Stores embed on the way in and on the way out, so callers deal in text.
///
/// Implementations:
/// - `WeaviateStore`: Weaviate over REST/GraphQL
/// - `InMemoryVectorStore`: process-local store for development and tests
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection with the fixed `content/source/page` schema if it
    /// does not exist. Returns whether it was created.
    async fn ensure_collection(&self, name: &str) -> Result<bool>;

    /// Whether the collection exists, without creating it
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Embed and persist chunks in one batch. Returns the number stored.
    ///
    /// Any failure aborts the whole call; nothing is retried.
    async fn add(&self, chunks: Vec<Chunk>) -> Result<usize>;

    /// Return at most `k` records nearest to `query`
    async fn search(&self, query: &str, k: usize) -> Result<Vec<StoredRecord>>;

    /// Total number of stored records
    async fn count(&self) -> Result<usize>;

    /// First `limit` records, for inspection
    async fn fetch(&self, limit: usize) -> Result<Vec<StoredRecord>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Release the connection. Later calls fail.
    async fn close(&self) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Collection this store reads and writes
    fn collection(&self) -> &str;
}
