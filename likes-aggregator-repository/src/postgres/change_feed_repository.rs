use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use tracing::warn;

use likes_aggregator_shared::types::{ChangeId, VoteChange, VoteSnapshot};

use crate::{ChangeFeedError, ChangeFeedRepository};

/// Delivery settings of the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFeedConfig {
    /// How long a claimed change stays invisible to other workers.
    pub lease: Duration,
    /// Number of failed deliveries after which a change is no longer handed out.
    pub max_attempts: i32,
}

impl Default for ChangeFeedConfig {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

/// PostgreSQL-backed change feed over the `vote_changes` outbox.
///
/// Several workers may poll the same outbox: claiming uses `FOR UPDATE SKIP LOCKED`
/// and a lease so that each change is in flight with at most one worker at a time.
pub struct PostgresChangeFeedRepository {
    pool: sqlx::PgPool,
    config: ChangeFeedConfig,
}

impl PostgresChangeFeedRepository {
    pub fn new(pool: sqlx::PgPool, config: ChangeFeedConfig) -> Self {
        Self { pool, config }
    }

    fn change_from_row(row: &PgRow) -> Result<VoteChange, ChangeFeedError> {
        let id: i64 = row.try_get("id")?;
        let path: String = row.try_get("path")?;
        let snapshot = |column: &str| {
            row.try_get::<Option<Json<VoteSnapshot>>, _>(column)
                .map(|state| state.map(|Json(snapshot)| snapshot))
                .map_err(|e| ChangeFeedError::InvalidPayload {
                    id,
                    reason: format!("{column}: {e}"),
                })
        };
        Ok(VoteChange::new(
            id,
            path,
            snapshot("before_state")?,
            snapshot("after_state")?,
        ))
    }
}

#[async_trait]
impl ChangeFeedRepository for PostgresChangeFeedRepository {
    async fn claim_changes(&self, limit: i64) -> Result<Vec<VoteChange>, ChangeFeedError> {
        // A change is not handed out while an earlier change of the same vote
        // record is leased, so one record's changes are applied in feed order.
        let rows = sqlx::query(
            "UPDATE vote_changes SET claimed_until = now() + make_interval(secs => $2) \
             WHERE id IN ( \
                 SELECT c.id FROM vote_changes c \
                 WHERE c.delivered_at IS NULL \
                   AND c.attempts < $3 \
                   AND (c.claimed_until IS NULL OR c.claimed_until < now()) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM vote_changes e \
                       WHERE e.path = c.path \
                         AND e.id < c.id \
                         AND e.delivered_at IS NULL \
                         AND e.attempts < $3 \
                         AND e.claimed_until >= now() \
                   ) \
                 ORDER BY c.id \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, path, before_state, after_state",
        )
        .bind(limit)
        .bind(self.config.lease.as_secs_f64())
        .bind(self.config.max_attempts)
        .fetch_all(&self.pool)
        .await?;

        let mut changes = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::change_from_row(row) {
                Ok(change) => changes.push(change),
                Err(ChangeFeedError::InvalidPayload { id, reason }) => {
                    // An undecodable change can never succeed; park it.
                    warn!(change_id = id, reason = %reason, "Dropping undecodable vote change");
                    sqlx::query(
                        "UPDATE vote_changes SET claimed_until = NULL, attempts = $2, last_error = $3 \
                         WHERE id = $1",
                    )
                    .bind(id)
                    .bind(self.config.max_attempts)
                    .bind(&reason)
                    .execute(&self.pool)
                    .await?;
                }
                Err(e) => return Err(e),
            }
        }
        changes.sort_by_key(|change| change.id);
        Ok(changes)
    }

    async fn ack_change(&self, id: ChangeId) -> Result<(), ChangeFeedError> {
        sqlx::query("UPDATE vote_changes SET delivered_at = now(), claimed_until = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn nack_change(&self, id: ChangeId, error: &str) -> Result<(), ChangeFeedError> {
        let row = sqlx::query(
            "UPDATE vote_changes SET claimed_until = NULL, attempts = attempts + 1, last_error = $2 \
             WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let attempts: i32 = row.try_get("attempts")?;
            if attempts >= self.config.max_attempts {
                warn!(
                    change_id = id,
                    attempts = attempts,
                    error = %error,
                    "Vote change reached the delivery attempt limit and will not be redelivered"
                );
            }
        }
        Ok(())
    }
}
