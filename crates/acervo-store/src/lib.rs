//! Acervo Storage Layer
//!
//! Implements the DocumentStore trait on top of SQLite.
//!
//! # Layout
//!
//! - One `documents` table; tags are stored as a JSON array
//! - Historical dates as ISO `YYYY-MM-DD` text, creation time as Unix milliseconds
//! - Identifiers as 16-byte big-endian blobs
//!
//! # Examples
//!
//! ```no_run
//! use acervo_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for document operations
//! ```

#![warn(missing_docs)]

use acervo_domain::document::creation_timestamp;
use acervo_domain::traits::{CreateError, DocumentStore};
use acervo_domain::{Document, DocumentId, DocumentInput};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str =
    "SELECT id, title, date, source, category, tags, image_url, transcription, created_at FROM documents";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format in a stored row
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Tag list could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SQLite-based implementation of DocumentStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks by
/// wrapping it in a `Mutex`; each `create` is a single INSERT and therefore
/// atomic on its own.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use acervo_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("acervo.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Convert DocumentId to bytes for storage
    fn id_to_bytes(id: DocumentId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to DocumentId
    fn bytes_to_id(bytes: &[u8]) -> Result<DocumentId, StoreError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            StoreError::InvalidData(format!(
                "Expected 16 bytes for DocumentId, got {}",
                bytes.len()
            ))
        })?;
        Ok(DocumentId::from_value(u128::from_be_bytes(arr)))
    }

    /// Map a result row onto a Document
    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let conversion = |idx: usize, ty: rusqlite::types::Type, e: StoreError| {
            rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
        };

        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map_err(|e| conversion(0, rusqlite::types::Type::Blob, e))?;

        let date_text: String = row.get(2)?;
        let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
            conversion(
                2,
                rusqlite::types::Type::Text,
                StoreError::InvalidData(format!("Bad date '{}': {}", date_text, e)),
            )
        })?;

        let tags_json: String = row.get(5)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| conversion(5, rusqlite::types::Type::Text, StoreError::from(e)))?;

        let created_millis: i64 = row.get(8)?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_millis).ok_or_else(|| {
            conversion(
                8,
                rusqlite::types::Type::Integer,
                StoreError::InvalidData(format!("Timestamp out of range: {}", created_millis)),
            )
        })?;

        Ok(Document {
            id,
            title: row.get(1)?,
            date,
            source: row.get(3)?,
            category: row.get(4)?,
            tags,
            image_url: row.get(6)?,
            transcription: row.get(7)?,
            created_at,
        })
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn create(&mut self, input: DocumentInput) -> Result<Document, CreateError<Self::Error>> {
        input.validate()?;

        let tags_json = serde_json::to_string(&input.tags)
            .map_err(|e| CreateError::Backend(StoreError::from(e)))?;
        let document = Document::from_input(DocumentId::new(), input, creation_timestamp());

        self.conn
            .execute(
                "INSERT INTO documents (id, title, date, source, category, tags, image_url, transcription, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    Self::id_to_bytes(document.id),
                    &document.title,
                    document.date.format(DATE_FORMAT).to_string(),
                    &document.source,
                    &document.category,
                    tags_json,
                    &document.image_url,
                    &document.transcription,
                    document.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| CreateError::Backend(StoreError::from(e)))?;

        debug!("Stored document {} ('{}')", document.id, document.title);

        Ok(document)
    }

    fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>, Self::Error> {
        let document = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![Self::id_to_bytes(id)],
                Self::row_to_document,
            )
            .optional()?;

        Ok(document)
    }

    fn list_all(&self) -> Result<Vec<Document>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY rowid", SELECT_COLUMNS))?;

        let documents = stmt
            .query_map([], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn ping(&self) -> Result<(), Self::Error> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_round_trip() {
        let id = DocumentId::new();
        let bytes = SqliteStore::id_to_bytes(id);
        assert_eq!(bytes.len(), 16);
        assert_eq!(SqliteStore::bytes_to_id(&bytes).unwrap(), id);
    }

    #[test]
    fn test_bytes_to_id_wrong_length() {
        assert!(matches!(
            SqliteStore::bytes_to_id(&[1, 2, 3]),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_ping_and_count_on_empty_store() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(store.ping().is_ok());
        assert_eq!(store.count().unwrap(), 0);
    }
}
