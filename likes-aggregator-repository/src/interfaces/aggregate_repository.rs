//! This module defines the `AggregateRepository` trait, the only way to change an
//! aggregate like counter.
use likes_aggregator_shared::types::{AggregateKey, LikesAggregate};

use crate::errors::AggregateRepositoryError;

/// A trait that defines the interface for the denormalized like counters.
///
/// Counters can be read, but they can only be changed through [`apply_delta`],
/// which implementors must run as a transactional read-modify-write that
/// serializes against concurrent appliers on the same key.
///
/// [`apply_delta`]: AggregateRepository::apply_delta
#[async_trait::async_trait]
pub trait AggregateRepository: Send + Sync {
    /// Atomically adds `delta` to the counter identified by `key`.
    ///
    /// A missing counter document is treated as a count of zero and created.
    /// The stored count is clamped at zero, `updatedAt` is set to the commit time
    /// and any other fields of the document are left untouched. A `delta` of zero
    /// changes nothing and returns the current count.
    ///
    /// # Arguments
    ///
    /// * `key` - The aggregate counter to update
    /// * `delta` - Signed change to apply
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - The committed count
    /// * `Err(AggregateRepositoryError)` - Storage failure, or conflicting commits
    ///   outlasted the retry budget
    async fn apply_delta(
        &self,
        key: &AggregateKey,
        delta: i64,
    ) -> Result<i64, AggregateRepositoryError>;

    /// Reads the counter identified by `key`, if it has ever been written.
    async fn get_aggregate(
        &self,
        key: &AggregateKey,
    ) -> Result<Option<LikesAggregate>, AggregateRepositoryError>;
}
