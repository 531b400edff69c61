//! Response types for the HTTP API and the generator

use serde::{Deserialize, Serialize};

/// Liveness message returned by `GET /health`
pub const HEALTH_MESSAGE: &str = "API is running";

/// Answer returned by `/predict` for a blank question
pub const NO_QUESTION_MESSAGE: &str = "⚠️ Aucune question fournie.";

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: HEALTH_MESSAGE.to_string(),
        }
    }
}

/// `POST /index_pdf` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IndexResponse {
    /// File loaded, chunked and stored
    Indexed,
    /// Ingestion failed; the message is the error's display text
    Error { message: String },
}

impl IndexResponse {
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed)
    }
}

/// `POST /predict` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub result: String,
}

/// An answer produced by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answered from the retrieved context
    Grounded(String),
    /// The model refused on the context; answered from the bare question
    Ungrounded(String),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Self::Grounded(text) | Self::Ungrounded(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Grounded(text) | Self::Ungrounded(text) => text,
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded(_))
    }
}
