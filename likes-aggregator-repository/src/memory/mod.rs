//! In-memory implementations of the repository traits.
//!
//! They keep the same transactional guarantees as the PostgreSQL backend and are
//! used to embed the aggregator in-process and to test the pipeline without a database.
mod aggregate_repository;
mod vote_repository;

pub use aggregate_repository::InMemoryAggregateRepository;
pub use vote_repository::InMemoryVoteRepository;
