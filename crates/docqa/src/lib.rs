//! docqa: question answering over PDF and PowerPoint documents
//!
//! Uploaded documents are split into slide or element units (with OCR for
//! embedded images), chunked on semantic breakpoints, embedded, and stored in
//! a vector database. Questions are answered by an Ollama model from the
//! closest chunks, falling back to an unaided answer when the context is not
//! enough.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use config::DocQaConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, ChunkMetadata, DocumentUnit, FileType, StoredRecord, UnitKind},
    query::PredictRequest,
    response::{Answer, HealthResponse, IndexResponse, PredictResponse},
};
