//! PostgreSQL implementation of the likes aggregator repository.
//!
//! ## Database Tables
//!
//! - `like_aggregates`: Aggregate counter documents keyed by path
//! - `like_votes`: Per-user vote records
//! - `vote_changes`: Outbox of vote transitions written by the `record_vote_change` trigger
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

mod aggregate_repository;
mod change_feed_repository;
mod vote_repository;

pub use aggregate_repository::PostgresAggregateRepository;
pub use change_feed_repository::{ChangeFeedConfig, PostgresChangeFeedRepository};
pub use vote_repository::PostgresVoteRepository;

/// Opens a connection pool to the likes database.
pub async fn connect(url: &str, max_connections: u32) -> Result<sqlx::PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./src/postgres/migrations").run(pool).await
}
