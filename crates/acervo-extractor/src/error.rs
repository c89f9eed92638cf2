//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while extracting text from a document
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No bytes were supplied
    #[error("Document is empty")]
    Empty,

    /// Input exceeds the configured size limit
    #[error("Document too large: {size} bytes (max: {limit})")]
    TooLarge {
        /// Size of the input in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Input is not a zip package
    #[error("Not a word-processor package: {0}")]
    NotAnArchive(String),

    /// The package lacks a required part
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// A package part could not be read or decoded
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::InvalidArchive(reason) => {
                ExtractionError::NotAnArchive(reason.to_string())
            }
            other => ExtractionError::Malformed(other.to_string()),
        }
    }
}
