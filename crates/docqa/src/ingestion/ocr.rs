//! OCR of slide images through the tesseract CLI

use std::io::Write;
use std::process::Command;

use crate::error::{Error, Result};

/// Text recognition over raw image bytes
pub trait OcrEngine: Send + Sync {
    /// Recognise text in an encoded image (PNG, JPEG, ...)
    fn recognize(&self, image: &[u8]) -> Result<String>;

    /// Engine name for logs
    fn name(&self) -> &str;
}

/// Tesseract invoked as an external process
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    /// Check if the tesseract binary can be launched
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let mut input = tempfile::Builder::new()
            .prefix("docqa-ocr-")
            .tempfile()
            .map_err(|e| Error::ocr(format!("Failed to create temp image: {}", e)))?;
        input
            .write_all(image)
            .map_err(|e| Error::ocr(format!("Failed to write temp image: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .args(["stdout", "-l", &self.language])
            .output()
            .map_err(|e| Error::ocr(format!("{} failed to start: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ocr(format!("tesseract error: {}", stderr.trim())));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!("OCR extracted {} characters", text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
