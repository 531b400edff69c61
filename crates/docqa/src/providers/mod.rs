//! Provider abstractions for embeddings, LLM and vector storage
//!
//! Trait objects let the server switch between local ONNX or Ollama
//! embeddings and between Weaviate or an in-memory store from configuration.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod onnx;
pub mod vector_store;
pub mod weaviate;

pub use embedding::{cosine_similarity, l2_normalize, EmbeddingProvider};
pub use llm::LlmProvider;
pub use memory::InMemoryVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use onnx::OnnxEmbedder;
pub use vector_store::VectorStoreProvider;
pub use weaviate::WeaviateStore;
