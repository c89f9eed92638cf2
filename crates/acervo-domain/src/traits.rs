//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Document, DocumentId, DocumentInput, ValidationError};
use thiserror::Error;

/// Trait for persisting and retrieving documents
///
/// Implemented by the infrastructure layer (acervo-store)
pub trait DocumentStore {
    /// Error type for backend failures
    type Error;

    /// Validate and persist a new document
    ///
    /// Assigns `id` and `created_at`. Either the complete record is stored
    /// and returned, or nothing is stored.
    fn create(&mut self, input: DocumentInput) -> Result<Document, CreateError<Self::Error>>;

    /// Get a document by ID
    fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>, Self::Error>;

    /// List every document; order is not significant
    fn list_all(&self) -> Result<Vec<Document>, Self::Error>;

    /// Check that the backend is reachable
    fn ping(&self) -> Result<(), Self::Error>;
}

/// Failure to create a document
#[derive(Error, Debug)]
pub enum CreateError<E> {
    /// The record violates a field invariant; nothing was stored
    #[error("Invalid document: {0}")]
    Invalid(#[from] ValidationError),

    /// The backend failed
    #[error("Store error: {0}")]
    Backend(E),
}

/// Trait for converting an uploaded word-processor file to plain text
///
/// Implemented by the infrastructure layer (acervo-extractor)
pub trait TextExtractor {
    /// Error type for extraction failures
    type Error;

    /// Extract plain text from the raw bytes of a document
    fn extract(&self, bytes: &[u8]) -> Result<String, Self::Error>;
}

/// An uploaded file as received from a submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    /// Client-side file name, if sent
    pub file_name: Option<String>,
    /// Declared MIME type, if sent
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload from bytes alone
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Whether the upload carries no content
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Trait for storing scanned images outside the document store
///
/// Implemented by the ingestion layer (acervo-ingest)
pub trait ImageStore {
    /// Error type for image storage failures
    type Error;

    /// Store an image and return a retrievable reference URL
    fn store(&self, image: &Upload) -> Result<String, Self::Error>;

    /// Remove a previously stored image by its reference URL
    fn discard(&self, url: &str) -> Result<(), Self::Error>;
}
