//! Acervo Domain Layer
//!
//! This crate contains the document model and the pure catalog logic for
//! Acervo, an archive of scanned historical documents. It defines the
//! fundamental concepts, value objects, and trait interfaces that the
//! storage, extraction, ingestion, and HTTP layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Document**: metadata + transcription for one historical source item
//! - **DocumentInput**: a validated-on-create record without store-assigned fields
//! - **Catalog**: the filtered, sorted view of all documents
//! - **Transcription**: plain text extracted from an uploaded word-processor file
//!
//! ## Architecture
//!
//! - Pure business logic only (no I/O)
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod document;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use catalog::{CatalogQuery, CategoryFilter, SortKey};
pub use document::{Document, DocumentId, DocumentInput};
pub use error::ValidationError;
