//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The gateway only checks that fields are present; anything about their
/// types or values is left to the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was absent (or null) in a payload.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A row returned by the store did not have the expected shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl DomainError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }
}
