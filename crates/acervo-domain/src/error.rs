//! Validation errors for document records

use thiserror::Error;

/// A document record failed field validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only
    #[error("Required field '{0}' is empty")]
    EmptyField(&'static str),

    /// The document date could not be parsed as a calendar date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl ValidationError {
    /// Name of the offending field, for reporting back to the submitter
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField(field) => *field,
            ValidationError::InvalidDate(_) => "date",
        }
    }
}
