// Validation errors reported to callers

use thiserror::Error;

/// Input rejected before the store is touched.
///
/// Store operations return these wrapped in an `eyre::Report`; use
/// `report.downcast_ref::<ValidationError>()` to tell them apart from
/// storage failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task text cannot be empty")]
    EmptyText,
}

/// Trim `text` and reject it when nothing is left
pub fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed)
}
