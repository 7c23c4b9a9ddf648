//! Error types for the likes aggregator repository.
//! Consolidates and re-exports error types related to repository operations.
mod aggregate;
mod change_feed;
mod vote;

pub use aggregate::AggregateRepositoryError;
pub use change_feed::ChangeFeedError;
pub use vote::VoteRepositoryError;

/// SQLSTATE codes PostgreSQL reports when a serializable transaction must be retried.
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// Whether a database error is a serialization failure or deadlock that a retry resolves.
pub(crate) fn is_retryable_sqlx_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}
