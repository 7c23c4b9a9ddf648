use async_trait::async_trait;
use sqlx::Row;

use likes_aggregator_shared::types::{AggregateKey, VoteKey, VoteSnapshot};

use crate::{VoteRepository, VoteRepositoryError};

/// PostgreSQL-backed vote records.
///
/// Writes go to `like_votes`; the `record_vote_change` trigger appends the matching
/// change to `vote_changes` inside the same transaction.
pub struct PostgresVoteRepository {
    pool: sqlx::PgPool,
}

impl PostgresVoteRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn put_vote(&self, key: &VoteKey, liked: bool) -> Result<(), VoteRepositoryError> {
        sqlx::query(
            "INSERT INTO like_votes (aggregate_path, user_id, liked, ts) VALUES ($1, $2, $3, now()) \
             ON CONFLICT (aggregate_path, user_id) DO UPDATE SET liked = EXCLUDED.liked, ts = EXCLUDED.ts",
        )
        .bind(key.aggregate.path())
        .bind(&key.user_id)
        .bind(liked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_vote(&self, key: &VoteKey) -> Result<bool, VoteRepositoryError> {
        let result = sqlx::query("DELETE FROM like_votes WHERE aggregate_path = $1 AND user_id = $2")
            .bind(key.aggregate.path())
            .bind(&key.user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_vote(&self, key: &VoteKey) -> Result<Option<VoteSnapshot>, VoteRepositoryError> {
        let row = sqlx::query("SELECT liked FROM like_votes WHERE aggregate_path = $1 AND user_id = $2")
            .bind(key.aggregate.path())
            .bind(&key.user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(VoteSnapshot {
                liked: row.try_get("liked")?,
            })),
            None => Ok(None),
        }
    }

    async fn count_liked(&self, aggregate: &AggregateKey) -> Result<i64, VoteRepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS liked FROM like_votes WHERE aggregate_path = $1 AND liked",
        )
        .bind(aggregate.path())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("liked")?)
    }
}
