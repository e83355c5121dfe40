//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent input that cannot be turned into a record bag at all.
/// Field-level problems never surface here; they are omitted from the tree.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid JSON document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream reported an error: {message}")]
    Upstream { message: String },

    #[error("UTC offset out of range: {0} minutes")]
    InvalidUtcOffset(i32),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
