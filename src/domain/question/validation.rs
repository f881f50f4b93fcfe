//! Question validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for question IDs
pub const MAX_QUESTION_ID_LENGTH: usize = 128;

static QUESTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:-]*$").expect("valid question id regex"));

/// Question validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionValidationError {
    EmptyId,
    IdTooLong { length: usize, max: usize },
    InvalidIdFormat { id: String },
    EmptyQuestion { id: String },
    DuplicateId { id: String },
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Question ID cannot be empty"),
            Self::IdTooLong { length, max } => {
                write!(f, "Question ID too long: {} characters (max {})", length, max)
            }
            Self::InvalidIdFormat { id } => write!(
                f,
                "Invalid question ID '{}': must start alphanumeric and contain only [A-Za-z0-9._:-]",
                id
            ),
            Self::EmptyQuestion { id } => write!(f, "Question '{}' has no question text", id),
            Self::DuplicateId { id } => write!(f, "Duplicate question ID '{}'", id),
        }
    }
}

impl std::error::Error for QuestionValidationError {}

/// Validate a question ID
pub fn validate_question_id(id: &str) -> Result<(), QuestionValidationError> {
    if id.is_empty() {
        return Err(QuestionValidationError::EmptyId);
    }

    if id.len() > MAX_QUESTION_ID_LENGTH {
        return Err(QuestionValidationError::IdTooLong {
            length: id.len(),
            max: MAX_QUESTION_ID_LENGTH,
        });
    }

    if !QUESTION_ID_PATTERN.is_match(id) {
        return Err(QuestionValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}
