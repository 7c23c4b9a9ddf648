use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{instrument, warn};

use likes_aggregator_shared::types::{AggregateKey, LikesAggregate};

use crate::retry::TransactionRetry;
use crate::{AggregateRepository, AggregateRepositoryError};

#[derive(Debug, Clone)]
struct StoredAggregate {
    aggregate: LikesAggregate,
    version: u64,
}

/// A consistent read of one counter, remembered for the optimistic commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    count: i64,
    version: Option<u64>,
}

/// Aggregate counters held in process memory.
///
/// Each document carries a version number. A delta application reads a snapshot,
/// computes the clamped next value without holding any lock, then commits with a
/// compare-and-swap on the version; if another applier committed in between, the
/// attempt fails with a conflict and is retried against the fresh value.
pub struct InMemoryAggregateRepository {
    documents: RwLock<HashMap<AggregateKey, StoredAggregate>>,
    retry: TransactionRetry,
    forced_conflicts: AtomicUsize,
}

impl InMemoryAggregateRepository {
    pub fn new() -> Self {
        Self::with_retry(TransactionRetry::default())
    }

    pub fn with_retry(retry: TransactionRetry) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            retry,
            forced_conflicts: AtomicUsize::new(0),
        }
    }

    fn read_snapshot(&self, key: &AggregateKey) -> Snapshot {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        match documents.get(key) {
            Some(stored) => Snapshot {
                count: stored.aggregate.count,
                version: Some(stored.version),
            },
            None => Snapshot {
                count: 0,
                version: None,
            },
        }
    }

    fn commit(
        &self,
        key: &AggregateKey,
        read: Snapshot,
        next: i64,
    ) -> Result<i64, AggregateRepositoryError> {
        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(AggregateRepositoryError::Conflict(key.to_string()));
        }

        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        let current_version = documents.get(key).map(|stored| stored.version);
        if current_version != read.version {
            return Err(AggregateRepositoryError::Conflict(key.to_string()));
        }

        let version = current_version.map_or(0, |v| v + 1);
        documents.insert(
            key.clone(),
            StoredAggregate {
                aggregate: LikesAggregate {
                    count: next,
                    updated_at: Utc::now(),
                },
                version,
            },
        );
        Ok(next)
    }

    async fn try_apply_delta(
        &self,
        key: &AggregateKey,
        delta: i64,
    ) -> Result<i64, AggregateRepositoryError> {
        let read = self.read_snapshot(key);
        let (next, clamped) = LikesAggregate::clamped_next(read.count, delta);
        let committed = self.commit(key, read, next)?;
        if clamped {
            warn!(
                aggregate = %key,
                current = read.count,
                delta = delta,
                "Aggregate count would have gone negative, clamped at zero"
            );
        }
        Ok(committed)
    }

    #[cfg(test)]
    fn force_conflicts(&self, count: usize) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }
}

impl Default for InMemoryAggregateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AggregateRepository for InMemoryAggregateRepository {
    #[instrument(skip(self), fields(aggregate = %key))]
    async fn apply_delta(
        &self,
        key: &AggregateKey,
        delta: i64,
    ) -> Result<i64, AggregateRepositoryError> {
        if delta == 0 {
            return Ok(self.read_snapshot(key).count);
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
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        Ok(documents.get(key).map(|stored| stored.aggregate.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn key() -> AggregateKey {
        AggregateKey::from_path("likes/moqueca")
    }

    fn fast_retry(max_retries: usize) -> TransactionRetry {
        TransactionRetry {
            max_retries,
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_first_delta_creates_document() {
        let repository = InMemoryAggregateRepository::new();
        assert!(repository.get_aggregate(&key()).await.unwrap().is_none());

        let count = repository.apply_delta(&key(), 1).await.unwrap();

        assert_eq!(count, 1);
        let stored = repository.get_aggregate(&key()).await.unwrap().unwrap();
        assert_eq!(stored.count, 1);
    }

    #[tokio::test]
    async fn test_negative_delta_on_missing_document_clamps() {
        let repository = InMemoryAggregateRepository::new();

        let count = repository.apply_delta(&key(), -1).await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(repository.get_aggregate(&key()).await.unwrap().unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_clamp_over_sequence() {
        let repository = InMemoryAggregateRepository::new();
        let deltas = [-1, 1, 1, -1, -1, -1, 1];
        let expected = [0, 1, 2, 1, 0, 0, 1];

        for (delta, expected) in deltas.into_iter().zip(expected) {
            let count = repository.apply_delta(&key(), delta).await.unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test]
    async fn test_zero_delta_does_not_touch_document() {
        let repository = InMemoryAggregateRepository::new();
        repository.apply_delta(&key(), 1).await.unwrap();
        let before = repository.get_aggregate(&key()).await.unwrap().unwrap();

        let count = repository.apply_delta(&key(), 0).await.unwrap();

        let after = repository.get_aggregate(&key()).await.unwrap().unwrap();
        assert_eq!(count, 1);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_zero_delta_does_not_create_document() {
        let repository = InMemoryAggregateRepository::new();
        assert_eq!(repository.apply_delta(&key(), 0).await.unwrap(), 0);
        assert!(repository.get_aggregate(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_commit_is_rejected() {
        let repository = InMemoryAggregateRepository::new();
        let stale = repository.read_snapshot(&key());

        repository.apply_delta(&key(), 1).await.unwrap();

        let result = repository.commit(&key(), stale, 1);
        assert!(matches!(result, Err(AggregateRepositoryError::Conflict(_))));
        assert_eq!(repository.get_aggregate(&key()).await.unwrap().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_conflicts_are_retried() {
        let repository = InMemoryAggregateRepository::with_retry(fast_retry(3));
        repository.force_conflicts(2);

        let count = repository.apply_delta(&key(), 1).await.unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_leaves_count_untouched() {
        let repository = InMemoryAggregateRepository::with_retry(fast_retry(2));
        repository.apply_delta(&key(), 1).await.unwrap();
        repository.force_conflicts(3);

        let result = repository.apply_delta(&key(), 1).await;

        assert!(matches!(
            result,
            Err(AggregateRepositoryError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(repository.get_aggregate(&key()).await.unwrap().unwrap().count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let repository = Arc::new(InMemoryAggregateRepository::with_retry(fast_retry(64)));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repository = repository.clone();
                tokio::spawn(async move { repository.apply_delta(&key(), 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repository.get_aggregate(&key()).await.unwrap().unwrap().count, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_like_and_unlike_converge_to_serial_outcome() {
        for _ in 0..20 {
            let repository = Arc::new(InMemoryAggregateRepository::with_retry(fast_retry(64)));
            let like = {
                let repository = repository.clone();
                tokio::spawn(async move { repository.apply_delta(&key(), 1).await })
            };
            let unlike = {
                let repository = repository.clone();
                tokio::spawn(async move { repository.apply_delta(&key(), -1).await })
            };
            like.await.unwrap().unwrap();
            unlike.await.unwrap().unwrap();

            // +1 then -1 gives 0; -1 (clamped) then +1 gives 1.
            let count = repository.get_aggregate(&key()).await.unwrap().unwrap().count;
            assert!(count == 0 || count == 1, "unexpected count {count}");
        }
    }
}
