//! Error types for the loader module of the Likes Aggregator Pipeline.
//! Defines the errors that can occur while applying deltas to the aggregate store.
use thiserror::Error;
use likes_aggregator_repository::AggregateRepositoryError;

/// Represents errors that can occur within the aggregate loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Aggregate repository error: {0}")]
    AggregateRepository(#[from] AggregateRepositoryError),
}
