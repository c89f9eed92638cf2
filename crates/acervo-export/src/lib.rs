//! Acervo Export
//!
//! Renders a single catalog document, together with an optional excerpt the
//! reader selected, as a downloadable file.
//!
//! Two formats are supported:
//! - [`ExportFormat::Structured`]: pretty-printed JSON holding the full record
//! - [`ExportFormat::Plain`]: a human-readable text block
//!
//! Exporting is a pure transformation. Delivering the bytes is up to the caller.

#![warn(missing_docs)]

use acervo_domain::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Content type of structured exports
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of plain-text exports
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Errors from exporting or re-reading exports
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested format name is not recognized
    #[error("Unknown export format '{0}': expected json or txt")]
    UnknownFormat(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Machine-readable JSON
    #[default]
    Structured,
    /// Human-readable text
    Plain,
}

impl ExportFormat {
    /// File extension used in suggested filenames
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Structured => "json",
            ExportFormat::Plain => "txt",
        }
    }

    /// MIME type of the exported bytes
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Structured => JSON_CONTENT_TYPE,
            ExportFormat::Plain => TEXT_CONTENT_TYPE,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "structured" => Ok(ExportFormat::Structured),
            "txt" | "text" | "plain" => Ok(ExportFormat::Plain),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Body of a structured export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    /// The exported record, all fields included
    pub document: Document,
    /// Excerpt selected by the reader; empty when none was given
    #[serde(default)]
    pub selected_text: String,
}

/// A rendered export, ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    /// File contents
    pub bytes: Vec<u8>,
    /// Suggested filename
    pub filename: String,
    /// MIME type of `bytes`
    pub content_type: &'static str,
}

/// Export a document in the given format
pub fn export(
    document: &Document,
    format: ExportFormat,
    excerpt: Option<&str>,
) -> Result<ExportedDocument, ExportError> {
    let excerpt = excerpt.unwrap_or_default();

    let bytes = match format {
        ExportFormat::Structured => {
            let envelope = ExportEnvelope {
                document: document.clone(),
                selected_text: excerpt.to_string(),
            };
            serde_json::to_vec_pretty(&envelope)?
        }
        ExportFormat::Plain => plain_text(document, excerpt).into_bytes(),
    };

    let filename = format!("{}.{}", slug(&document.title), format.extension());
    debug!("Exported {} as {} ({} bytes)", document.id, filename, bytes.len());

    Ok(ExportedDocument {
        bytes,
        filename,
        content_type: format.content_type(),
    })
}

/// Read back the bytes of a structured export
pub fn parse_structured(bytes: &[u8]) -> Result<ExportEnvelope, ExportError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Filename stem derived from a title
///
/// # Examples
///
/// ```
/// use acervo_export::slug;
///
/// assert_eq!(slug("Decreto Nº 21.076"), "decreto-nº-21.076");
/// assert_eq!(slug("   "), "document");
/// ```
pub fn slug(title: &str) -> String {
    let slug = title
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}

fn plain_text(document: &Document, excerpt: &str) -> String {
    let text = format!(
        "Title: {}\nDate: {}\nSource: {}\nCategory: {}\nTags: {}\n\nTranscription:\n{}\n\nSelected Text:\n{}",
        document.title,
        document.date.format("%Y-%m-%d"),
        document.source,
        document.category,
        document.tags.join(", "),
        document.transcription,
        excerpt,
    );
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Structured);
        assert_eq!("Structured".parse::<ExportFormat>().unwrap(), ExportFormat::Structured);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Plain);
        assert_eq!(" TEXT ".parse::<ExportFormat>().unwrap(), ExportFormat::Plain);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(f)) if f == "pdf"
        ));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Bertha Lutz - Manifesto Feminista"), "bertha-lutz---manifesto-feminista");
        assert_eq!(slug("Ata  da\tSessão"), "ata-da-sessão");
        assert_eq!(slug("Cartas 1920/1925"), "cartas-1920-1925");
        assert_eq!(slug("..\\relatório"), "..-relatório");
        assert_eq!(slug(""), "document");
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Plain.extension(), "txt");
        assert_eq!(ExportFormat::Structured.content_type(), JSON_CONTENT_TYPE);
        assert_eq!(ExportFormat::default(), ExportFormat::Structured);
        assert_eq!(ExportFormat::Plain.to_string(), "txt");
    }
}
