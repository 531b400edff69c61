//! Format dispatch for uploaded documents

use std::path::Path;
use std::sync::Arc;

use super::convert::LibreOfficeConverter;
use super::ocr::{OcrEngine, TesseractOcr};
use super::pdf::PdfLoader;
use super::pptx::PptxLoader;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentUnit, FileType};

/// Loads PDF and PowerPoint files into document units
#[derive(Clone)]
pub struct DocumentLoader {
    pdf: PdfLoader,
    pptx: PptxLoader,
    converter: LibreOfficeConverter,
}

impl DocumentLoader {
    /// Build a loader with tesseract OCR (when enabled) and LibreOffice conversion
    pub fn from_config(config: &LoaderConfig) -> Self {
        let ocr: Option<Arc<dyn OcrEngine>> = if config.ocr_enabled {
            let engine = TesseractOcr::new(&config.tesseract_cmd, &config.ocr_language);
            if !engine.is_available() {
                tracing::warn!(
                    "{} not found; slide images will not be OCR'd",
                    config.tesseract_cmd
                );
            }
            Some(Arc::new(engine))
        } else {
            None
        };

        Self::new(ocr, LibreOfficeConverter::new(&config.libreoffice_cmd))
    }

    pub fn new(ocr: Option<Arc<dyn OcrEngine>>, converter: LibreOfficeConverter) -> Self {
        Self {
            pdf: PdfLoader::new(),
            pptx: PptxLoader::new(ocr),
            converter,
        }
    }

    /// Load `path`, attributing every unit to `source`.
    ///
    /// The format comes from the path's extension, or from the file's magic
    /// bytes when the path has none. Anything other than PDF/PPT/PPTX is
    /// rejected.
    pub fn load(&self, path: &Path, source: &str) -> Result<Vec<DocumentUnit>> {
        let data = std::fs::read(path)?;
        let name = path.to_string_lossy();
        let file_type = FileType::detect(&name, &data);

        tracing::info!("Loading {} as {}", source, file_type.display_name());

        match file_type {
            FileType::Pdf => self.pdf.load_bytes(&data, source),
            FileType::Pptx => self.pptx.load_bytes(&data, source),
            FileType::Ppt => {
                let converted = self.converter.ppt_to_pptx(path, source)?;
                self.pptx.load(converted.path(), source)
            }
            FileType::Unknown => Err(Error::UnsupportedFileType(unsupported_label(path, source))),
        }
    }
}

fn unsupported_label(path: &Path, source: &str) -> String {
    Path::new(source)
        .extension()
        .or_else(|| path.extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| source.to_string())
}
