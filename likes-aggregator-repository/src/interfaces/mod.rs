//! This module defines and re-exports the interfaces for the likes aggregator repository.
//! It serves as a central point for accessing traits related to data interaction.
mod aggregate_repository;
mod change_feed_repository;
mod vote_repository;

pub use aggregate_repository::AggregateRepository;
pub use change_feed_repository::ChangeFeedRepository;
pub use vote_repository::VoteRepository;
