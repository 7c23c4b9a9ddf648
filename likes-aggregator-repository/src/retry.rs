//! Bounded retry of optimistic aggregate transactions.
use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;

use likes_aggregator_shared::types::AggregateKey;

use crate::errors::AggregateRepositoryError;

/// Default number of retries after the first conflicting attempt.
pub const DEFAULT_MAX_RETRIES: usize = 8;

/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(500);

/// Retry policy for transactions that lose a race against a concurrent commit.
///
/// Delays grow exponentially from 10ms (10, 20, 40, ...) up to `max_delay`, with
/// full jitter so that colliding appliers spread out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRetry {
    pub max_retries: usize,
    pub max_delay: Duration,
}

impl Default for TransactionRetry {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl TransactionRetry {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBackoff::from_millis(2)
            .factor(5)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_retries)
    }

    /// Runs `transaction` until it commits, retrying only on conflicts.
    ///
    /// When every attempt conflicts the error is reported as
    /// `AggregateRepositoryError::RetriesExhausted`; any other error is returned
    /// as soon as it happens.
    pub async fn run<T, A, F>(
        &self,
        key: &AggregateKey,
        transaction: A,
    ) -> Result<T, AggregateRepositoryError>
    where
        A: FnMut() -> F,
        F: Future<Output = Result<T, AggregateRepositoryError>>,
    {
        let should_retry = |error: &AggregateRepositoryError| {
            let conflict = error.is_conflict();
            if conflict {
                debug!(aggregate = %key, error = %error, "Aggregate transaction conflicted, retrying");
            }
            conflict
        };

        RetryIf::spawn(self.strategy(), transaction, should_retry)
            .await
            .map_err(|error| {
                if error.is_conflict() {
                    AggregateRepositoryError::RetriesExhausted {
                        key: key.to_string(),
                        attempts: self.max_retries + 1,
                    }
                } else {
                    error
                }
            })
    }
}
