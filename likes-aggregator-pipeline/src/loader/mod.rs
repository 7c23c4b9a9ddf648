//! This module defines the `AggregateLoader` struct responsible for applying
//! computed deltas to the aggregate counters.
//! It acts as the front of the aggregate updater, between the processing
//! pipeline and the counter store.
pub use likes_aggregator_repository::{AggregateRepository, AggregateRepositoryError};
pub use crate::errors::LoaderError;
use likes_aggregator_shared::types::AggregateDelta;
use std::sync::Arc;
use tracing::{debug, instrument};

/// `AggregateLoader` applies aggregate deltas through an `AggregateRepository`.
///
/// All concurrency control happens inside the repository: each delta is one
/// transactional read-modify-write that is retried on conflict.
pub struct AggregateLoader {
    pub aggregate_repository: Arc<dyn AggregateRepository>,
}

impl AggregateLoader {
    /// Creates a new `AggregateLoader` instance.
    ///
    /// # Arguments
    ///
    /// * `aggregate_repository` - The counter store the deltas are applied to.
    pub fn new(aggregate_repository: Arc<dyn AggregateRepository>) -> Self {
        Self { aggregate_repository }
    }

    /// Applies one delta and returns the committed count.
    ///
    /// A zero delta is not written and returns the current count.
    #[instrument(skip(self, delta), fields(aggregate = %delta.key, delta = delta.delta))]
    pub async fn apply(&self, delta: &AggregateDelta) -> Result<i64, LoaderError> {
        let count = self
            .aggregate_repository
            .apply_delta(&delta.key, delta.delta)
            .await?;
        debug!(count = count, "Applied aggregate delta");
        Ok(count)
    }

    /// Applies deltas one after the other, stopping at the first failure.
    pub async fn apply_all(&self, deltas: &[AggregateDelta]) -> Result<(), LoaderError> {
        for delta in deltas {
            self.apply(delta).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likes_aggregator_repository::InMemoryAggregateRepository;
    use likes_aggregator_shared::types::AggregateKey;

    fn delta(path: &str, delta: i64) -> AggregateDelta {
        AggregateDelta {
            key: AggregateKey::from_path(path),
            delta,
        }
    }

    #[tokio::test]
    async fn test_apply_returns_committed_count() {
        let loader = AggregateLoader::new(Arc::new(InMemoryAggregateRepository::new()));

        assert_eq!(loader.apply(&delta("likes/moqueca", 1)).await.unwrap(), 1);
        assert_eq!(loader.apply(&delta("likes/moqueca", 1)).await.unwrap(), 2);
        assert_eq!(loader.apply(&delta("likes/moqueca", -1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_apply_all_updates_each_aggregate() {
        let repository = Arc::new(InMemoryAggregateRepository::new());
        let loader = AggregateLoader::new(repository.clone());

        loader
            .apply_all(&[delta("likes/moqueca", 1), delta("likes_daily/2025-03-10/moqueca", 1)])
            .await
            .unwrap();

        for path in ["likes/moqueca", "likes_daily/2025-03-10/moqueca"] {
            let stored = repository
                .get_aggregate(&AggregateKey::from_path(path))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.count, 1);
        }
    }
}
