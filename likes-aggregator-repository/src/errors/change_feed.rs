use thiserror::Error;

/// Represents errors that can occur while claiming or acknowledging vote changes.
#[derive(Debug, Error)]
pub enum ChangeFeedError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid change payload for change {id}: {reason}")]
    InvalidPayload { id: i64, reason: String },
}
