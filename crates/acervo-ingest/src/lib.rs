//! Acervo Ingestion
//!
//! Turns a document submission into a stored catalog record.
//!
//! # Architecture
//!
//! ```text
//! form + uploads → required fields → tags → TextExtractor → ImageStore → DocumentStore
//! ```
//!
//! Missing or invalid fields abort before anything is written. A transcription
//! file that cannot be read is logged and replaced by an empty transcription;
//! it never fails the submission.
//!
//! # Example Usage
//!
//! ```no_run
//! use acervo_extractor::DocxExtractor;
//! use acervo_ingest::{FsImageStore, IngestConfig, IngestionPipeline, Submission, SubmissionForm};
//! use acervo_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Mutex::new(SqliteStore::new(":memory:")?));
//! let images = FsImageStore::new("data/images", "/images")?;
//! let pipeline = IngestionPipeline::new(DocxExtractor::default(), store, images, IngestConfig::default());
//!
//! let form = SubmissionForm {
//!     title: Some("Decreto Nº 21.076".to_string()),
//!     date: Some("1932-02-24".to_string()),
//!     source: Some("Arquivo Nacional".to_string()),
//!     category: Some("Legislação".to_string()),
//!     tags: Some("Voto Feminino, Marco Histórico".to_string()),
//! };
//!
//! let document = pipeline.ingest(Submission::from_form(form)).await?;
//! println!("Stored {}", document.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod form;
mod images;
mod pipeline;

pub use config::{IngestConfig, DEFAULT_PLACEHOLDER_IMAGE};
pub use error::IngestionError;
pub use form::{normalize_tags, Submission, SubmissionForm};
pub use images::{FsImageStore, ImageStoreError};
pub use pipeline::{IngestReport, IngestionPipeline, TranscriptionStatus};
