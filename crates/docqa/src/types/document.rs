//! Document units, chunks and stored records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Title reported for slides without a title placeholder
pub const UNTITLED_SLIDE: &str = "Non défini";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
    /// Old Microsoft PowerPoint (.ppt) - requires LibreOffice
    Ppt,
    /// Unknown file type
    Unknown,
}

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "pptx" => Self::Pptx,
            "ppt" => Self::Ppt,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Detect file type from content when no extension is available
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(PDF_MAGIC) {
            return Self::Pdf;
        }
        if data.starts_with(OLE2_MAGIC) {
            return Self::Ppt;
        }
        if data.starts_with(ZIP_MAGIC) {
            let is_presentation = zip::ZipArchive::new(Cursor::new(data))
                .map(|mut archive| archive.by_name("ppt/presentation.xml").is_ok())
                .unwrap_or(false);
            if is_presentation {
                return Self::Pptx;
            }
        }
        Self::Unknown
    }

    /// Detect from the filename first, then from content
    pub fn detect(filename: &str, data: &[u8]) -> Self {
        match Self::from_path(Path::new(filename)) {
            Self::Unknown if Path::new(filename).extension().is_none() => {
                Self::from_magic_bytes(data)
            }
            known => known,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Conventional extension (without the dot)
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Pdf => Some("pdf"),
            Self::Pptx => Some("pptx"),
            Self::Ppt => Some("ppt"),
            Self::Unknown => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Pptx => "PowerPoint (.pptx)",
            Self::Ppt => "PowerPoint (.ppt)",
            Self::Unknown => "Unknown",
        }
    }
}

/// What a loaded unit represents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Structural element of a PDF page
    #[default]
    Element,
    /// Whole slide of a presentation
    #[serde(rename = "powerpoint")]
    Slide,
}

/// A unit of text produced by the document loader.
///
/// Slides become exactly one unit each; PDF pages are split into their
/// structural elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUnit {
    content: String,
    source: String,
    page: Option<u32>,
    title: Option<String>,
    kind: UnitKind,
    metadata: HashMap<String, Value>,
}

impl DocumentUnit {
    /// Create a unit for one element of a PDF page
    pub fn pdf_element(
        content: String,
        source: impl Into<String>,
        page: u32,
        element_index: usize,
        category: &str,
    ) -> Self {
        let source = source.into();
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), Value::from(source.clone()));
        metadata.insert("page".to_string(), Value::from(page));
        metadata.insert("page_number".to_string(), Value::from(page));
        metadata.insert("element_index".to_string(), Value::from(element_index));
        metadata.insert("category".to_string(), Value::from(category));
        metadata.insert("filetype".to_string(), Value::from("application/pdf"));

        Self {
            content,
            source,
            page: Some(page),
            title: None,
            kind: UnitKind::Element,
            metadata,
        }
    }

    /// Create a unit for a whole slide
    pub fn slide(
        content: String,
        source: impl Into<String>,
        slide_number: u32,
        title: Option<String>,
    ) -> Self {
        let source = source.into();
        let title = title.filter(|t| !t.trim().is_empty());
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), Value::from(source.clone()));
        metadata.insert("page".to_string(), Value::from(slide_number));
        metadata.insert("type".to_string(), Value::from("powerpoint"));
        metadata.insert("slide_number".to_string(), Value::from(slide_number));
        metadata.insert(
            "slide_title".to_string(),
            Value::from(title.clone().unwrap_or_else(|| UNTITLED_SLIDE.to_string())),
        );

        Self {
            content,
            source,
            page: Some(slide_number),
            title,
            kind: UnitKind::Slide,
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Slide title, or `Non défini` when the slide has none
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_SLIDE)
    }

    /// Full loader metadata
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }
}

/// Metadata kept on a chunk: exactly the source and page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Originating filename
    pub source: String,
    /// Page or slide number, 0 when unknown
    pub page: u32,
}

impl ChunkMetadata {
    /// Narrow a rich metadata map down to `{source, page}`
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Self {
        let source = metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let page = metadata
            .get("page")
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0);

        Self { source, page }
    }
}

/// A retrieval unit stored in the vector database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Text content
    pub content: String,
    /// Source and page
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A record returned by the vector store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub content: String,
    pub source: String,
    pub page: u32,
    /// Distance to the query (lower is closer); absent when fetched without a query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("pptx"), FileType::Pptx);
        assert_eq!(FileType::from_extension("Ppt"), FileType::Ppt);
        assert_eq!(FileType::from_extension("docx"), FileType::Unknown);
        assert!(!FileType::Unknown.is_supported());
    }

    #[test]
    fn test_file_type_from_magic_bytes() {
        assert_eq!(FileType::from_magic_bytes(b"%PDF-1.7\n"), FileType::Pdf);
        assert_eq!(FileType::from_magic_bytes(OLE2_MAGIC), FileType::Ppt);
        assert_eq!(FileType::from_magic_bytes(b"hello"), FileType::Unknown);

        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("ppt/presentation.xml", options).unwrap();
            zip.write_all(b"<p:presentation/>").unwrap();
            zip.finish().unwrap();
        }
        assert_eq!(FileType::from_magic_bytes(buf.get_ref()), FileType::Pptx);
    }

    #[test]
    fn test_detect_prefers_extension() {
        assert_eq!(FileType::detect("notes.txt", b"%PDF-1.4"), FileType::Unknown);
        assert_eq!(FileType::detect("upload", b"%PDF-1.4"), FileType::Pdf);
    }

    #[test]
    fn test_untitled_slide() {
        let unit = DocumentUnit::slide("Numéro de slide: 2".into(), "deck.pptx", 2, Some("  ".into()));
        assert_eq!(unit.title(), UNTITLED_SLIDE);
        assert_eq!(unit.kind(), UnitKind::Slide);
        assert_eq!(unit.metadata()["slide_title"], UNTITLED_SLIDE);
    }

    #[test]
    fn test_chunk_metadata_narrowing() {
        let unit = DocumentUnit::pdf_element("Bonjour.".into(), "guide.pdf", 4, 0, "NarrativeText");
        let meta = ChunkMetadata::from_metadata(unit.metadata());
        assert_eq!(meta, ChunkMetadata { source: "guide.pdf".into(), page: 4 });

        let json = serde_json::to_value(&meta).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"source".to_string()));
        assert!(keys.contains(&"page".to_string()));
    }

    #[test]
    fn test_chunk_metadata_defaults() {
        let mut metadata = HashMap::new();
        metadata.insert("page".to_string(), Value::from("n/a"));
        let meta = ChunkMetadata::from_metadata(&metadata);
        assert_eq!(meta.page, 0);
        assert_eq!(meta.source, "");
    }
}
