//! Core types for the document QA service

pub mod document;
pub mod query;
pub mod response;

pub use document::{
    Chunk, ChunkMetadata, DocumentUnit, FileType, StoredRecord, UnitKind, UNTITLED_SLIDE,
};
pub use query::{PredictRequest, DEFAULT_MODEL};
pub use response::{
    Answer, HealthResponse, IndexResponse, PredictResponse, HEALTH_MESSAGE, NO_QUESTION_MESSAGE,
};
