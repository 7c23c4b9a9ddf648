//! # Likes Aggregator Repository
//! This crate provides traits and implementations for the storage behind the likes
//! aggregator: the aggregate counters, the per-user vote records and the change feed
//! that reports vote transitions. It includes definitions for errors, interfaces,
//! a PostgreSQL implementation and an in-memory implementation.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod retry;

pub use errors::{AggregateRepositoryError, ChangeFeedError, VoteRepositoryError};
pub use interfaces::{AggregateRepository, ChangeFeedRepository, VoteRepository};
pub use memory::{InMemoryAggregateRepository, InMemoryVoteRepository};
pub use postgres::{
    ChangeFeedConfig, PostgresAggregateRepository, PostgresChangeFeedRepository,
    PostgresVoteRepository,
};
pub use retry::TransactionRetry;
