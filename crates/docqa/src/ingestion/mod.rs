//! Document ingestion: PDF/PowerPoint loading, OCR, semantic chunking

pub mod chunker;
pub mod convert;
pub mod loader;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod pptx;
pub mod table;

pub use chunker::SemanticChunker;
pub use convert::LibreOfficeConverter;
pub use loader::DocumentLoader;
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::PdfLoader;
pub use pipeline::{collect_documents, IngestPipeline};
pub use pptx::PptxLoader;
