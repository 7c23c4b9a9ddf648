use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

use likes_aggregator_repository::ChangeFeedRepository;

use crate::consumer::{ConsumeVoteChanges, StreamMessage};
use crate::errors::ConsumerError;

/// Configuration for polling the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Pause between two polls that found no full batch.
    pub poll_interval: Duration,
    /// Maximum number of changes claimed per poll.
    pub batch_size: i64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 100,
        }
    }
}

/// Consumer that polls the durable change feed.
///
/// A poll that returns a full batch is followed by another poll right away, so a
/// backlog is drained without waiting for the interval.
pub struct PostgresChangeFeedConsumer {
    feed: Arc<dyn ChangeFeedRepository>,
    config: PollingConfig,
}

impl PostgresChangeFeedConsumer {
    pub fn new(feed: Arc<dyn ChangeFeedRepository>, config: PollingConfig) -> Self {
        Self { feed, config }
    }

    async fn settle(&self, message: StreamMessage) {
        let StreamMessage::Acknowledgment { id, success, error } = message else {
            warn!("Received non-acknowledgment message on ack channel");
            return;
        };

        let result = if success {
            self.feed.ack_change(id).await
        } else {
            let reason = error.unwrap_or_else(|| "unknown error".to_string());
            debug!(change_id = id, error = %reason, "Releasing vote change for redelivery");
            self.feed.nack_change(id, &reason).await
        };

        // The lease runs out on its own, so the change is redelivered anyway.
        if let Err(e) = result {
            error!(change_id = id, error = %e, "Failed to settle vote change");
        }
    }

    async fn drain_acks(&self, ack_receiver: &mut mpsc::UnboundedReceiver<StreamMessage>) {
        while let Ok(message) = ack_receiver.try_recv() {
            self.settle(message).await;
        }
    }
}

#[async_trait]
impl ConsumeVoteChanges for PostgresChangeFeedConsumer {
    #[instrument(skip_all, fields(batch_size = self.config.batch_size))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::UnboundedReceiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ConsumerError> {
        info!("Polling vote change feed");
        let mut poll_timer = interval(self.config.poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Change feed consumer shutting down");
                    break;
                }
                Some(message) = ack_receiver.recv() => {
                    self.settle(message).await;
                }
                _ = poll_timer.tick() => {
                    let changes = match self.feed.claim_changes(self.config.batch_size).await {
                        Ok(changes) => changes,
                        Err(e) => {
                            error!(error = %e, "Failed to claim vote changes");
                            if sender.send(StreamMessage::Error(e.to_string())).await.is_err() {
                                break;
                            }
                            continue;
                        }
                    };
                    if changes.is_empty() {
                        continue;
                    }

                    let full_batch = changes.len() as i64 >= self.config.batch_size;
                    debug!(change_count = changes.len(), "Claimed vote changes");
                    if sender.send(StreamMessage::Changes(changes)).await.is_err() {
                        debug!("Orchestrator is gone, stopping change feed consumer");
                        break;
                    }
                    if full_batch {
                        poll_timer.reset_immediately();
                    }
                }
            }
        }

        self.drain_acks(&mut ack_receiver).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likes_aggregator_repository::ChangeFeedError;
    use likes_aggregator_shared::types::{ChangeId, VoteChange, VoteSnapshot};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockFeed {
        pending: Mutex<Vec<VoteChange>>,
        acked: Mutex<Vec<ChangeId>>,
        nacked: Mutex<Vec<(ChangeId, String)>>,
    }

    #[async_trait]
    impl ChangeFeedRepository for MockFeed {
        async fn claim_changes(&self, limit: i64) -> Result<Vec<VoteChange>, ChangeFeedError> {
            let mut pending = self.pending.lock().unwrap();
            let take = pending.len().min(limit as usize);
            Ok(pending.drain(..take).collect())
        }

        async fn ack_change(&self, id: ChangeId) -> Result<(), ChangeFeedError> {
            self.acked.lock().unwrap().push(id);
            Ok(())
        }

        async fn nack_change(&self, id: ChangeId, error: &str) -> Result<(), ChangeFeedError> {
            self.nacked.lock().unwrap().push((id, error.to_string()));
            Ok(())
        }
    }

    fn change(id: ChangeId) -> VoteChange {
        VoteChange::created(id, format!("likes/moqueca/votes/uid-{id}"), VoteSnapshot::liked())
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_batches_and_settles_acks() {
        let feed = Arc::new(MockFeed::default());
        feed.pending.lock().unwrap().extend((1..=3).map(change));
        let consumer = PostgresChangeFeedConsumer::new(
            feed.clone(),
            PollingConfig {
                poll_interval: Duration::from_millis(10),
                batch_size: 2,
            },
        );

        let (sender, mut receiver) = mpsc::channel(8);
        let (ack_sender, ack_receiver) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown) = broadcast::channel(1);
        let handle = tokio::spawn(async move { consumer.run(sender, ack_receiver, shutdown).await });

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first, StreamMessage::Changes(vec![change(1), change(2)]));
        assert_eq!(second, StreamMessage::Changes(vec![change(3)]));

        ack_sender.send(StreamMessage::ack(1)).unwrap();
        ack_sender.send(StreamMessage::ack(3)).unwrap();
        ack_sender.send(StreamMessage::nack(2, "boom")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_sender.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(*feed.acked.lock().unwrap(), vec![1, 3]);
        assert_eq!(*feed.nacked.lock().unwrap(), vec![(2, "boom".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_orchestrator_is_gone() {
        let feed = Arc::new(MockFeed::default());
        feed.pending.lock().unwrap().push(change(1));
        let consumer = PostgresChangeFeedConsumer::new(feed, PollingConfig::default());

        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let (_ack_sender, ack_receiver) = mpsc::unbounded_channel();
        let (_shutdown_sender, shutdown) = broadcast::channel(1);

        consumer.run(sender, ack_receiver, shutdown).await.unwrap();
    }
}
