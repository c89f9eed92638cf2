//! .docx package handling

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::xml::document_text;
use acervo_domain::traits::TextExtractor;
use std::io::{Cursor, Read, Seek};
use tracing::debug;
use zip::ZipArchive;

/// Path of the main document part inside a WordprocessingML package
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts plain text from .docx uploads
///
/// Stateless apart from its limits, so one instance can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct DocxExtractor {
    config: ExtractorConfig,
}

impl DocxExtractor {
    /// Create a new extractor with the given limits
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract the text of a .docx package
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }
        if bytes.len() > self.config.max_input_bytes {
            return Err(ExtractionError::TooLarge {
                size: bytes.len(),
                limit: self.config.max_input_bytes,
            });
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let xml = read_part(&mut archive, DOCUMENT_PART, self.config.max_xml_bytes)?;
        let text = document_text(&xml).map_err(ExtractionError::Malformed)?;

        debug!(
            "Extracted {} chars from {} byte package",
            text.chars().count(),
            bytes.len()
        );

        Ok(text)
    }
}

impl TextExtractor for DocxExtractor {
    type Error = ExtractionError;

    fn extract(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        self.extract_text(bytes)
    }
}

/// Read one package part as UTF-8, refusing to inflate past `limit` bytes
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    limit: usize,
) -> Result<String, ExtractionError> {
    let part = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ExtractionError::MissingPart(name.to_string()),
        other => ExtractionError::from(other),
    })?;

    let mut buf = Vec::new();
    part.take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ExtractionError::Malformed(format!("{}: {}", name, e)))?;

    if buf.len() > limit {
        return Err(ExtractionError::Malformed(format!(
            "{} inflates past {} bytes",
            name, limit
        )));
    }

    String::from_utf8(buf)
        .map_err(|e| ExtractionError::Malformed(format!("{} is not UTF-8: {}", name, e)))
}
