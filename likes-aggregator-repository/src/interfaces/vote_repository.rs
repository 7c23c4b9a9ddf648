use likes_aggregator_shared::types::{AggregateKey, VoteKey, VoteSnapshot};

use crate::errors::VoteRepositoryError;

/// Trait for the per-user vote records written by the menu client.
///
/// Every successful write produces exactly one change on the change feed,
/// carrying the record's state before and after the write.
#[async_trait::async_trait]
pub trait VoteRepository: Send + Sync {
    /// Creates or overwrites a vote, stamping it with the server time.
    async fn put_vote(&self, key: &VoteKey, liked: bool) -> Result<(), VoteRepositoryError>;

    /// Removes a vote. Returns `false` when there was nothing to remove.
    async fn delete_vote(&self, key: &VoteKey) -> Result<bool, VoteRepositoryError>;

    async fn get_vote(&self, key: &VoteKey) -> Result<Option<VoteSnapshot>, VoteRepositoryError>;

    /// Counts the liked votes under one aggregate by reading the vote records
    /// themselves. Unlike the aggregate counter this is never stale.
    async fn count_liked(&self, aggregate: &AggregateKey) -> Result<i64, VoteRepositoryError>;
}
