//! Error types for ingestion

use acervo_domain::ValidationError;
use thiserror::Error;

/// Errors that abort an ingestion
///
/// Transcription extraction failures are not listed here: they downgrade to
/// an empty transcription instead of failing the submission.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// A required form field is absent or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but its value is not acceptable
    #[error("Invalid document: {0}")]
    Invalid(#[from] ValidationError),

    /// The uploaded image exceeds the configured limit
    #[error("Image too large: {size} bytes (max: {limit})")]
    ImageTooLarge {
        /// Size of the upload in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// The image could not be stored
    #[error("Image storage failed: {0}")]
    ImageStorage(String),

    /// The document store could not complete the write
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),
}

impl IngestionError {
    /// The form field this error is about, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            IngestionError::MissingField(field) => Some(*field),
            IngestionError::Invalid(e) => Some(e.field()),
            IngestionError::ImageTooLarge { .. } => Some("image"),
            _ => None,
        }
    }
}
