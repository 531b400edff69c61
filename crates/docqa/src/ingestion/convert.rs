//! Legacy `.ppt` conversion through headless LibreOffice

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{Error, Result};

/// A converted file living in a scoped temporary directory.
///
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct ConvertedFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ConvertedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Converts legacy Office files with `libreoffice --headless --convert-to`
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    command: String,
}

impl LibreOfficeConverter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Check if LibreOffice can be launched
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Convert a `.ppt` presentation into `.pptx`
    pub fn ppt_to_pptx(&self, input: &Path, source: &str) -> Result<ConvertedFile> {
        self.convert(input, source, "pptx")
    }

    fn convert(&self, input: &Path, source: &str, target_ext: &str) -> Result<ConvertedFile> {
        let dir = tempfile::Builder::new()
            .prefix("docqa-convert-")
            .tempdir()
            .map_err(|e| Error::file_parse(source, format!("Failed to create temp dir: {}", e)))?;

        tracing::info!("Converting {} to {} with {}", source, target_ext, self.command);

        let output = Command::new(&self.command)
            .arg("--headless")
            .arg("--convert-to")
            .arg(target_ext)
            .arg("--outdir")
            .arg(dir.path())
            .arg(input)
            .output()
            .map_err(|e| {
                Error::file_parse(
                    source,
                    format!("LibreOffice is required to read this file ({}): {}", self.command, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::file_parse(
                source,
                format!("LibreOffice conversion failed: {}", stderr.trim()),
            ));
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = dir.path().join(format!("{}.{}", stem, target_ext));

        if !path.exists() {
            return Err(Error::file_parse(
                source,
                "LibreOffice conversion produced no output",
            ));
        }

        Ok(ConvertedFile { _dir: dir, path })
    }
}
