//! PDF loading: one unit per structural element
//!
//! Pages are read with lopdf and split into elements on blank lines. When
//! lopdf finds no text at all, pdf-extract is tried on the whole document.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::DocumentUnit;

const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);
const TITLE_MAX_CHARS: usize = 80;

/// Loader for PDF documents
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a PDF from disk
    pub fn load(&self, path: &Path, source: &str) -> Result<Vec<DocumentUnit>> {
        let data = std::fs::read(path)?;
        self.load_bytes(&data, source)
    }

    /// Load a PDF from memory
    pub fn load_bytes(&self, data: &[u8], source: &str) -> Result<Vec<DocumentUnit>> {
        let pages = match extract_pages(data) {
            Ok(pages) if pages.iter().any(|(_, text)| !text.trim().is_empty()) => pages,
            Ok(_) => {
                tracing::warn!("lopdf found no text in {}, trying pdf-extract", source);
                extract_with_timeout(data).map_err(|e| Error::file_parse(source, e))?
            }
            Err(e) => {
                tracing::warn!("lopdf failed on {}: {}, trying pdf-extract", source, e);
                extract_with_timeout(data).map_err(|e| Error::file_parse(source, e))?
            }
        };

        let mut units = Vec::new();
        for (page, text) in pages {
            for (index, element) in split_elements(&text).into_iter().enumerate() {
                let category = element_category(&element);
                units.push(DocumentUnit::pdf_element(element, source, page, index, category));
            }
        }

        if units.is_empty() {
            return Err(Error::file_parse(
                source,
                "No text content could be extracted from PDF",
            ));
        }

        tracing::info!("Loaded {} elements from {}", units.len(), source);
        Ok(units)
    }
}

/// Text per page, keyed by 1-based page number
fn extract_pages(data: &[u8]) -> std::result::Result<Vec<(u32, String)>, String> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| format!("Failed to load PDF: {}", e))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.push((page_number, clean_text(&text))),
            Err(e) => tracing::debug!("No text on page {}: {}", page_number, e),
        }
    }
    Ok(pages)
}

/// Whole-document extraction with pdf-extract on a worker thread, bounded by
/// a timeout since some fonts make it spin. Form feeds mark page breaks.
fn extract_with_timeout(data: &[u8]) -> std::result::Result<Vec<(u32, String)>, String> {
    let data = data.to_vec();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let result = pdf_extract::extract_text_from_mem(&data);
        let _ = tx.send(result);
    });

    let text = match rx.recv_timeout(FALLBACK_TIMEOUT) {
        Ok(Ok(text)) => {
            let _ = handle.join();
            text
        }
        Ok(Err(e)) => {
            let _ = handle.join();
            return Err(format!("Failed to extract PDF text: {}", e));
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!("PDF extraction timed out after {:?}", FALLBACK_TIMEOUT);
            return Err("PDF extraction timed out".to_string());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            return Err("PDF extraction thread crashed".to_string());
        }
    };

    Ok(text
        .split('\x0c')
        .enumerate()
        .map(|(i, page)| (i as u32 + 1, clean_text(page)))
        .collect())
}

fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Split page text into elements: blocks separated by blank lines, with the
/// lines of each block whitespace-normalised and joined by spaces.
pub fn split_elements(text: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut block: Vec<String> = Vec::new();

    for line in text.lines() {
        let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            if !block.is_empty() {
                elements.push(block.join(" "));
                block.clear();
            }
        } else {
            block.push(normalized);
        }
    }
    if !block.is_empty() {
        elements.push(block.join(" "));
    }

    elements
}

/// Short unpunctuated one-liners read as titles
fn element_category(element: &str) -> &'static str {
    let short = element.chars().count() <= TITLE_MAX_CHARS;
    let punctuated = element.ends_with(['.', '?', '!', ':', ';', ',']);
    if short && !punctuated {
        "Title"
    } else {
        "NarrativeText"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a PDF whose pages each draw the given lines
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("TL", vec![14.into()]),
            ];
            for line in lines.iter() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_split_elements() {
        let text = "Titre  du   document\n\nPremière ligne\n  suite de la ligne.\n\n\n";
        assert_eq!(
            split_elements(text),
            vec!["Titre du document", "Première ligne suite de la ligne."]
        );
        assert!(split_elements("  \n \n").is_empty());
    }

    #[test]
    fn test_element_category() {
        assert_eq!(element_category("Introduction"), "Title");
        assert_eq!(element_category("Le réseau est stable."), "NarrativeText");
    }

    #[test]
    fn test_load_pages() {
        let data = build_pdf(&[&["Hello page one"], &["Second page text"]]);
        let units = PdfLoader::new().load_bytes(&data, "report.pdf").unwrap();

        assert!(!units.is_empty());
        assert!(units.iter().all(|u| u.source() == "report.pdf"));
        assert!(units.iter().any(|u| u.page() == Some(1) && u.content().contains("Hello")));
        assert!(units.iter().any(|u| u.page() == Some(2) && u.content().contains("Second")));

        let again = PdfLoader::new().load_bytes(&data, "report.pdf").unwrap();
        assert_eq!(units.len(), again.len());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfLoader::new().load_bytes(b"%PDF-1.4 broken", "bad.pdf").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
