//! Submission payloads and field normalization

use crate::error::IngestionError;
use acervo_domain::document::parse_document_date;
use acervo_domain::traits::Upload;
use chrono::NaiveDate;

/// Raw text fields of a document submission, as received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    /// Document title
    pub title: Option<String>,
    /// Historical date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Provenance
    pub source: Option<String>,
    /// Classification
    pub category: Option<String>,
    /// Comma-delimited labels
    pub tags: Option<String>,
}

impl SubmissionForm {
    /// Record a named text field; returns false for names the form does not know
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "date" => &mut self.date,
            "source" => &mut self.source,
            "category" => &mut self.category,
            "tags" => &mut self.tags,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Check and parse the required fields, in form order
    pub(crate) fn required(&self) -> Result<RequiredFields, IngestionError> {
        let title = require(&self.title, "title")?;
        let date = require(&self.date, "date")?;
        let source = require(&self.source, "source")?;
        let category = require(&self.category, "category")?;

        Ok(RequiredFields {
            title: title.to_string(),
            date: parse_document_date(date)?,
            source: source.to_string(),
            category: category.to_string(),
        })
    }
}

/// A complete submission: form fields plus optional uploads
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Text fields
    pub form: SubmissionForm,
    /// Scanned image
    pub image: Option<Upload>,
    /// Word-processor file holding the transcription
    pub transcription: Option<Upload>,
}

impl Submission {
    /// A submission with text fields only
    pub fn from_form(form: SubmissionForm) -> Self {
        Self {
            form,
            image: None,
            transcription: None,
        }
    }
}

/// Required fields after presence checks and parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequiredFields {
    pub title: String,
    pub date: NaiveDate,
    pub source: String,
    pub category: String,
}

fn require<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, IngestionError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(IngestionError::MissingField(field))
}

/// Split a comma-delimited tag string
///
/// Each element is trimmed and empty elements are dropped. Order is kept.
///
/// # Examples
///
/// ```
/// use acervo_ingest::normalize_tags;
///
/// assert_eq!(
///     normalize_tags(Some("Voto Feminino, Marco Histórico,,")),
///     vec!["Voto Feminino", "Marco Histórico"]
/// );
/// assert!(normalize_tags(None).is_empty());
/// ```
pub fn normalize_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|tags| {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
