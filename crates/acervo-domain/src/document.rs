//! Document module - the sole entity of the catalog

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a document based on UUIDv7
///
/// Assigned by the store at creation time and never reused. UUIDv7 keeps
/// identifiers roughly ordered by creation time without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DocumentId(u128);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    ///
    /// # Examples
    ///
    /// ```
    /// use acervo_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a DocumentId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a DocumentId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use acervo_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// let parsed = DocumentId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid document id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for DocumentId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

/// A catalogued historical document
///
/// Documents are immutable once created. `date` is the historical date the
/// source represents; `created_at` is when the record entered the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier, assigned by the store
    pub id: DocumentId,

    /// Title of the document
    pub title: String,

    /// Historical date of the source item
    pub date: NaiveDate,

    /// Provenance (archive or collection name)
    pub source: String,

    /// Classification from an open vocabulary
    pub category: String,

    /// Free-form labels in insertion order
    pub tags: Vec<String>,

    /// Reference to the scanned image, if one was stored
    pub image_url: Option<String>,

    /// Plain-text transcription; empty when none was provided
    pub transcription: String,

    /// Creation timestamp, assigned by the store
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Assemble a stored document from validated input and store-assigned fields
    pub fn from_input(id: DocumentId, input: DocumentInput, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            date: input.date,
            source: input.source,
            category: input.category,
            tags: input.tags,
            image_url: input.image_url,
            transcription: input.transcription,
            created_at,
        }
    }
}

/// A document record before the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
    /// Title of the document
    pub title: String,
    /// Historical date of the source item
    pub date: NaiveDate,
    /// Provenance
    pub source: String,
    /// Classification
    pub category: String,
    /// Labels
    pub tags: Vec<String>,
    /// Image reference
    pub image_url: Option<String>,
    /// Plain-text transcription
    pub transcription: String,
}

impl DocumentInput {
    /// Check the required text fields
    ///
    /// `title`, `source` and `category` must contain something other than
    /// whitespace. The date is enforced by its type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::EmptyField("source"));
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::EmptyField("category"));
        }
        Ok(())
    }
}

/// Current time at the precision the store persists (milliseconds)
pub fn creation_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a submitted document date
///
/// Accepts `YYYY-MM-DD`, or a full RFC 3339 timestamp which is reduced to
/// its calendar date.
pub fn parse_document_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> DocumentInput {
        DocumentInput {
            title: "Decreto Nº 21.076".to_string(),
            date: NaiveDate::from_ymd_opt(1932, 2, 24).unwrap(),
            source: "Arquivo Nacional".to_string(),
            category: "Legislação".to_string(),
            tags: vec!["Voto Feminino".to_string()],
            image_url: None,
            transcription: String::new(),
        }
    }

    #[test]
    fn test_document_id_ordering() {
        let id1 = DocumentId::from_value(1000);
        let id2 = DocumentId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_document_id_display_and_parse() {
        let id = DocumentId::new();
        let id_str = id.to_string();

        assert_eq!(id_str.len(), 36);
        assert_eq!(DocumentId::from_string(&id_str).unwrap(), id);
    }

    #[test]
    fn test_document_id_invalid_string() {
        assert!(DocumentId::from_string("not-a-valid-uuid").is_err());
        assert!(DocumentId::from_string("").is_err());
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut input = sample_input();
        input.title = "   ".to_string();
        assert_eq!(input.validate(), Err(ValidationError::EmptyField("title")));

        let mut input = sample_input();
        input.source = String::new();
        assert_eq!(input.validate(), Err(ValidationError::EmptyField("source")));

        let mut input = sample_input();
        input.category = "\t".to_string();
        assert_eq!(input.validate(), Err(ValidationError::EmptyField("category")));
    }

    #[test]
    fn test_parse_document_date() {
        let expected = NaiveDate::from_ymd_opt(1932, 2, 24).unwrap();
        assert_eq!(parse_document_date("1932-02-24").unwrap(), expected);
        assert_eq!(parse_document_date(" 1932-02-24 ").unwrap(), expected);
        assert_eq!(parse_document_date("1932-02-24T00:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_document_date("24/02/1932"),
            Err(ValidationError::InvalidDate("24/02/1932".to_string()))
        );
    }

    #[test]
    fn test_document_json_shape() {
        let doc = Document::from_input(DocumentId::new(), sample_input(), creation_timestamp());
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["date"], "1932-02-24");
        assert_eq!(value["id"], doc.id.to_string());
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("createdAt").is_some());

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
