use likes_aggregator_shared::types::{ChangeId, VoteChange};

use crate::errors::ChangeFeedError;

/// Trait for the durable feed of vote changes.
///
/// Delivery is at-least-once: a claimed change that is neither acknowledged nor
/// negatively acknowledged before its lease runs out is handed out again.
#[async_trait::async_trait]
pub trait ChangeFeedRepository: Send + Sync {
    /// Claims up to `limit` undelivered changes, oldest first.
    async fn claim_changes(&self, limit: i64) -> Result<Vec<VoteChange>, ChangeFeedError>;

    /// Marks a change as delivered; it will not be handed out again.
    async fn ack_change(&self, id: ChangeId) -> Result<(), ChangeFeedError>;

    /// Releases a change for redelivery and records why it failed.
    async fn nack_change(&self, id: ChangeId, error: &str) -> Result<(), ChangeFeedError>;
}
