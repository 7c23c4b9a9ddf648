use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{instrument, warn};

use likes_aggregator_shared::types::{AggregateKey, LikesAggregate};

use crate::retry::TransactionRetry;
use crate::{AggregateRepository, AggregateRepositoryError};

/// PostgreSQL-backed aggregate counters.
///
/// Every delta is applied in its own `SERIALIZABLE` transaction that reads the
/// current count, clamps the sum at zero and upserts the result. PostgreSQL aborts
/// one of two overlapping transactions on the same row with a serialization
/// failure, which is retried through [`TransactionRetry`].
pub struct PostgresAggregateRepository {
    pool: sqlx::PgPool,
    retry: TransactionRetry,
}

impl PostgresAggregateRepository {
    /// Creates a new repository on a pool whose schema has been migrated.
    pub fn new(pool: sqlx::PgPool, retry: TransactionRetry) -> Self {
        Self { pool, retry }
    }

    async fn read_count<'e, E>(executor: E, key: &AggregateKey) -> Result<i64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query("SELECT count FROM like_aggregates WHERE path = $1")
            .bind(key.path())
            .fetch_optional(executor)
            .await?;
        match row {
            Some(row) => row.try_get("count"),
            None => Ok(0),
        }
    }

    async fn try_apply_delta(
        &self,
        key: &AggregateKey,
        delta: i64,
    ) -> Result<i64, AggregateRepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let current = Self::read_count(&mut *tx, key).await?;
        let (next, clamped) = LikesAggregate::clamped_next(current, delta);

        // Only `count` and `updated_at` are written; any other attributes of the
        // document are preserved.
        sqlx::query(
            "INSERT INTO like_aggregates (path, count, updated_at) VALUES ($1, $2, clock_timestamp()) \
             ON CONFLICT (path) DO UPDATE SET count = EXCLUDED.count, updated_at = EXCLUDED.updated_at",
        )
        .bind(key.path())
        .bind(next)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if clamped {
            warn!(
                aggregate = %key,
                current = current,
                delta = delta,
                "Aggregate count would have gone negative, clamped at zero"
            );
        }
        Ok(next)
    }
}

#[async_trait]
impl AggregateRepository for PostgresAggregateRepository {
    #[instrument(skip(self), fields(aggregate = %key))]
    async fn apply_delta(
        &self,
        key: &AggregateKey,
        delta: i64,
    ) -> Result<i64, AggregateRepositoryError> {
        if delta == 0 {
            return Ok(Self::read_count(&self.pool, key).await?);
        }
        let repository = self;
        self.retry
            .run(key, move || repository.try_apply_delta(key, delta))
            .await
    }

    async fn get_aggregate(
        &self,
        key: &AggregateKey,
    ) -> Result<Option<LikesAggregate>, AggregateRepositoryError> {
        let row = sqlx::query("SELECT count, updated_at FROM like_aggregates WHERE path = $1")
            .bind(key.path())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let count: i64 = row.try_get("count")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(Some(LikesAggregate { count, updated_at }))
    }
}
