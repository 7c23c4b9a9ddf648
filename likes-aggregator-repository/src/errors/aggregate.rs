//! Error types for the aggregate repository.
//! Defines the errors that can occur while applying deltas to like counters.
use thiserror::Error;

/// Represents errors that can occur while reading or updating aggregate counters.
///
/// `Conflict` is transient and retried inside the repository; the other variants
/// are reported to the caller.
#[derive(Debug, Error)]
pub enum AggregateRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Transaction conflict on aggregate {0}")]
    Conflict(String),

    #[error("Gave up updating aggregate {key} after {attempts} conflicting attempts")]
    RetriesExhausted { key: String, attempts: usize },
}

impl AggregateRepositoryError {
    /// Whether retrying the whole transaction may succeed.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::DatabaseError(e) => super::is_retryable_sqlx_error(e),
            Self::RetriesExhausted { .. } => false,
        }
    }
}
