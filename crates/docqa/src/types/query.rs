//! Query request types

use serde::{Deserialize, Serialize};

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// The question to answer
    #[serde(default)]
    pub text: String,

    /// Ollama model name (default: llama3.2)
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl PredictRequest {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
        }
    }

    /// Whether the question carries any text at all
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_default() {
        let req: PredictRequest = serde_json::from_str(r#"{"text": "Qui ?"}"#).unwrap();
        assert_eq!(req.model, "llama3.2");
        assert!(!req.is_blank());
    }

    #[test]
    fn test_blank_question() {
        let req = PredictRequest::new("  \n", "mistral");
        assert!(req.is_blank());
    }
}
