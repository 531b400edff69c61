//! Retrieval-augmented answering with an ungrounded fallback

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::error::Result;
use crate::providers::{LlmProvider, VectorStoreProvider};
use crate::types::Answer;

/// Answers questions from the indexed corpus.
///
/// When the model declares the retrieved context insufficient, the same model
/// is asked the bare question instead.
pub struct RagGenerator {
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl RagGenerator {
    pub fn new(store: Arc<dyn VectorStoreProvider>, llm: Arc<dyn LlmProvider>, top_k: usize) -> Self {
        Self { store, llm, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` with `model`. Failures come back as a French error
    /// message rather than an `Err`.
    pub async fn answer(&self, question: &str, model: &str) -> String {
        match self.try_answer(question, model).await {
            Ok(answer) => answer.into_text(),
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                format!("Erreur lors de la génération : {}", e)
            }
        }
    }

    /// Typed variant of [`answer`](Self::answer)
    pub async fn try_answer(&self, question: &str, model: &str) -> Result<Answer> {
        let records = self.store.search(question, self.top_k).await?;
        tracing::debug!("Retrieved {} records for question", records.len());

        let context = PromptBuilder::build_context(&records);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        let response = self.llm.generate(model, &prompt).await?;
        let response = response.trim();

        if PromptBuilder::is_refusal(response) {
            tracing::info!("Context insufficient, asking {} without context", model);
            let fallback = self.llm.generate(model, question).await?;
            return Ok(Answer::Ungrounded(fallback.trim().to_string()));
        }

        Ok(Answer::Grounded(response.to_string()))
    }
}
