use thiserror::Error;

/// Failures surfaced to callers of the service layer.
#[derive(Debug, Error)]
pub enum IqacError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email, or a delete blocked by dependent records.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The record store was unreachable or rejected the query.
    #[error("record store error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type Result<T, E = IqacError> = std::result::Result<T, E>;
