//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for text generation with a per-call model choice
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (llama3.2, mistral, deepseek-r1, ...)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt` with the model named `model`
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Model used when the caller does not pick one
    fn default_model(&self) -> &str;
}
