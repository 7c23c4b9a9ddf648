use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info, warn};

use likes_aggregator_shared::types::{ChangeId, VoteChange};

use crate::consumer::{ConsumeVoteChanges, StreamMessage};
use crate::errors::ConsumerError;

/// In-process consumer fed by a channel, typically the one returned by
/// `InMemoryVoteRepository::new`.
///
/// Changes stay in flight until acknowledged. A failed change is delivered again
/// until it has been attempted `max_attempts` times. A change of a vote record
/// that still has an earlier change in flight is held back until that change is
/// settled, so changes of one record are never delivered out of order. The
/// stream ends once the sending side is closed and nothing is left in flight.
pub struct ChannelConsumer {
    receiver: Mutex<mpsc::UnboundedReceiver<VoteChange>>,
    batch_size: usize,
    max_attempts: u32,
}

struct InFlight {
    change: VoteChange,
    attempts: u32,
}

#[derive(Default)]
struct Deliveries {
    in_flight: HashMap<ChangeId, InFlight>,
    /// Changes waiting for an earlier change of the same vote record, by path.
    held_back: HashMap<String, VecDeque<VoteChange>>,
}

impl Deliveries {
    fn path_in_flight(&self, path: &str) -> bool {
        self.in_flight.values().any(|entry| entry.change.path == path)
    }

    fn dispatch(&mut self, change: &VoteChange) {
        self.in_flight.insert(
            change.id,
            InFlight {
                change: change.clone(),
                attempts: 0,
            },
        );
    }

    /// Returns the changes of `batch` that can be delivered now and holds back
    /// the others.
    fn admit(&mut self, batch: Vec<VoteChange>) -> Vec<VoteChange> {
        let busy: Vec<String> = batch
            .iter()
            .filter(|change| self.held_back.contains_key(&change.path) || self.path_in_flight(&change.path))
            .map(|change| change.path.clone())
            .collect();

        let mut ready = Vec::with_capacity(batch.len());
        for change in batch {
            if busy.contains(&change.path) {
                debug!(change_id = change.id, path = %change.path, "Holding back vote change");
                self.held_back.entry(change.path.clone()).or_default().push_back(change);
            } else {
                self.dispatch(&change);
                ready.push(change);
            }
        }
        ready
    }

    /// Releases the held back changes of `path` once none of its changes is in flight.
    fn release(&mut self, path: &str) -> Vec<VoteChange> {
        if self.path_in_flight(path) {
            return Vec::new();
        }
        let released: Vec<VoteChange> = self.held_back.remove(path).map(Vec::from).unwrap_or_default();
        for change in &released {
            self.dispatch(change);
        }
        released
    }

    /// Settles an acknowledgment and returns the changes to deliver next: the
    /// change itself when it is retried, otherwise the changes it held back.
    fn settle(&mut self, message: StreamMessage, max_attempts: u32) -> Vec<VoteChange> {
        let StreamMessage::Acknowledgment { id, success, error } = message else {
            warn!("Received non-acknowledgment message on ack channel");
            return Vec::new();
        };

        let Some(entry) = self.in_flight.get_mut(&id) else {
            return Vec::new();
        };
        if !success {
            entry.attempts += 1;
            if entry.attempts < max_attempts {
                debug!(change_id = id, attempts = entry.attempts, error = ?error, "Redelivering vote change");
                return vec![entry.change.clone()];
            }
            warn!(
                change_id = id,
                attempts = entry.attempts,
                error = ?error,
                "Vote change reached the delivery attempt limit, dropping it"
            );
        }

        match self.in_flight.remove(&id) {
            Some(settled) => self.release(&settled.change.path),
            None => Vec::new(),
        }
    }
}

impl ChannelConsumer {
    pub fn new(receiver: mpsc::UnboundedReceiver<VoteChange>, batch_size: usize, max_attempts: u32) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            batch_size: batch_size.max(1),
            max_attempts: max_attempts.max(1),
        }
    }
}

async fn deliver(sender: &mpsc::Sender<StreamMessage>, changes: Vec<VoteChange>) -> Result<(), ConsumerError> {
    if changes.is_empty() {
        return Ok(());
    }
    sender
        .send(StreamMessage::Changes(changes))
        .await
        .map_err(|e| ConsumerError::ChannelSend(e.to_string()))
}

#[async_trait]
impl ConsumeVoteChanges for ChannelConsumer {
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::UnboundedReceiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ConsumerError> {
        let mut receiver = self.receiver.lock().await;
        let mut deliveries = Deliveries::default();
        let mut source_open = true;

        loop {
            if !source_open && deliveries.in_flight.is_empty() {
                info!("Vote change channel closed, ending stream");
                let _ = sender.send(StreamMessage::End).await;
                break;
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Channel consumer shutting down");
                    break;
                }
                Some(message) = ack_receiver.recv() => {
                    let next = deliveries.settle(message, self.max_attempts);
                    deliver(&sender, next).await?;
                }
                change = receiver.recv(), if source_open => {
                    let Some(change) = change else {
                        source_open = false;
                        continue;
                    };
                    let mut batch = vec![change];
                    while batch.len() < self.batch_size {
                        match receiver.try_recv() {
                            Ok(change) => batch.push(change),
                            Err(_) => break,
                        }
                    }
                    let ready = deliveries.admit(batch);
                    deliver(&sender, ready).await?;
                }
            }
        }
        Ok(())
    }
}
