//! Application state for the API server

use std::sync::Arc;

use crate::config::{DocQaConfig, EmbeddingBackend, VectorBackend};
use crate::error::Result;
use crate::generation::{OllamaClient, RagGenerator};
use crate::ingestion::{DocumentLoader, IngestPipeline, SemanticChunker};
use crate::providers::{
    EmbeddingProvider, InMemoryVectorStore, LlmProvider, OllamaEmbedder, OllamaLlm,
    OnnxEmbedder, VectorStoreProvider, WeaviateStore,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DocQaConfig,
    /// Shared by the chunker, the store and retrieval
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    pipeline: IngestPipeline,
    rag: RagGenerator,
}

impl AppState {
    /// Build every provider from configuration and make sure the collection exists.
    ///
    /// An unreachable vector store or Ollama only logs a warning here; requests
    /// report the failure later.
    pub async fn new(config: DocQaConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (embeddings: {:?}, vector store: {:?})",
            config.embeddings.backend,
            config.vector_db.backend
        );

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
            EmbeddingBackend::Onnx => Arc::new(OnnxEmbedder::new(&config.embeddings).await?),
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::from_client(
                Arc::clone(&ollama),
                config.embedding_dimensions(),
            )),
        };
        tracing::info!("Embedder ready: {} ({} dims)", embedder.name(), embedder.dimensions());

        let store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
            VectorBackend::Weaviate => {
                Arc::new(WeaviateStore::new(&config.vector_db, Arc::clone(&embedder))?)
            }
            VectorBackend::Memory => Arc::new(InMemoryVectorStore::new(
                config.vector_db.collection.clone(),
                Arc::clone(&embedder),
            )),
        };

        match store.ensure_collection(&config.vector_db.collection).await {
            Ok(true) => tracing::info!("Created collection {}", config.vector_db.collection),
            Ok(false) => tracing::info!("Using existing collection {}", config.vector_db.collection),
            Err(e) => tracing::warn!(
                "Could not prepare collection {} on {}: {}",
                config.vector_db.collection,
                store.name(),
                e
            ),
        }

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OllamaLlm::from_client(ollama, config.llm.default_model.clone()));
        if !llm.health_check().await.unwrap_or(false) {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
        }

        let loader = DocumentLoader::from_config(&config.loader);
        Ok(Self::from_parts(config, embedder, store, llm, loader))
    }

    /// Assemble state from already-built providers
    pub fn from_parts(
        config: DocQaConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        loader: DocumentLoader,
    ) -> Self {
        let chunker = SemanticChunker::new(Arc::clone(&embedder), config.chunking.clone());
        let pipeline = IngestPipeline::new(Arc::new(loader), chunker, Arc::clone(&store));
        let rag = RagGenerator::new(
            Arc::clone(&store),
            Arc::clone(&llm),
            config.retrieval.top_k,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                store,
                llm,
                pipeline,
                rag,
            }),
        }
    }

    pub fn config(&self) -> &DocQaConfig {
        &self.inner.config
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.store
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn rag(&self) -> &RagGenerator {
        &self.inner.rag
    }

    /// Whether the vector store answers
    pub async fn is_ready(&self) -> bool {
        self.inner.store.health_check().await.unwrap_or(false)
    }

    /// Release the vector store connection
    pub async fn shutdown(&self) {
        match self.inner.store.close().await {
            Ok(()) => tracing::info!("Vector store closed"),
            Err(e) => tracing::warn!("Failed to close vector store: {}", e),
        }
    }
}
