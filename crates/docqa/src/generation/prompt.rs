//! Prompt templates for RAG generation

use crate::types::StoredRecord;

/// Sentence the model is told to emit when the context is not enough
pub const REFUSAL_SENTENCE: &str =
    "Je ne peux pas répondre à cette question avec les informations disponibles.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Context block: retrieved contents separated by blank lines
    pub fn build_context(records: &[StoredRecord]) -> String {
        records
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Grounded prompt instructing the model to answer from `context` only
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Réponds à la question suivante en te basant uniquement sur le contexte fourni.

Context: {context}

Question: {question}

Réponds uniquement à l'aide des informations présentes dans le contexte. Si tu ne peux pas répondre à la question avec les informations disponibles, dis : "{refusal}"

Réponse:"#,
            context = context,
            question = question,
            refusal = REFUSAL_SENTENCE,
        )
    }

    /// Whether a model response is the refusal sentence (possibly embedded)
    pub fn is_refusal(response: &str) -> bool {
        response.contains(REFUSAL_SENTENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> StoredRecord {
        StoredRecord {
            content: content.to_string(),
            source: "a.pdf".to_string(),
            page: 1,
            distance: None,
        }
    }

    #[test]
    fn test_build_context() {
        let context = PromptBuilder::build_context(&[record("Un"), record("Deux")]);
        assert_eq!(context, "Un\n\nDeux");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_prompt_contains_parts() {
        let prompt = PromptBuilder::build_rag_prompt("Qui ?", "Ada");
        assert!(prompt.contains("Context: Ada"));
        assert!(prompt.contains("Question: Qui ?"));
        assert!(prompt.contains(REFUSAL_SENTENCE));
        assert!(prompt.ends_with("Réponse:"));
    }

    #[test]
    fn test_is_refusal() {
        assert!(PromptBuilder::is_refusal(&format!("Désolé. {}", REFUSAL_SENTENCE)));
        assert!(!PromptBuilder::is_refusal("Paris"));
    }
}
