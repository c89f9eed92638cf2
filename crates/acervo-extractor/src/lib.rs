//! Acervo Extractor
//!
//! Converts uploaded word-processor files (.docx) into plain transcription
//! text.
//!
//! # Overview
//!
//! A .docx file is a zip package whose main part, `word/document.xml`,
//! holds the document body as WordprocessingML. The extractor opens the
//! package, reads that part and keeps only the visible text: runs are joined,
//! paragraphs and explicit breaks become line breaks, and formatting, tables,
//! images and styles are dropped.
//!
//! # Architecture
//!
//! ```text
//! bytes → zip package → word/document.xml → nom token scan → text
//! ```
//!
//! Extraction is a pure transformation. Callers decide what a failure means;
//! the ingestion pipeline treats it as "no transcription".
//!
//! # Example Usage
//!
//! ```no_run
//! use acervo_extractor::{DocxExtractor, ExtractorConfig};
//!
//! # fn example(bytes: &[u8]) -> Result<(), acervo_extractor::ExtractionError> {
//! let extractor = DocxExtractor::new(ExtractorConfig::default());
//! let text = extractor.extract_text(bytes)?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod docx;
mod error;
mod xml;


pub use config::ExtractorConfig;
pub use docx::{DocxExtractor, DOCUMENT_PART};
pub use error::ExtractionError;
