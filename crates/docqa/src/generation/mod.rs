//! Answer generation with Ollama and retrieved context

pub mod ollama;
pub mod prompt;
pub mod rag;

pub use ollama::OllamaClient;
pub use prompt::{PromptBuilder, REFUSAL_SENTENCE};
pub use rag::RagGenerator;
