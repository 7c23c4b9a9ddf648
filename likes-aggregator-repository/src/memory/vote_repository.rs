use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use likes_aggregator_shared::types::{AggregateKey, VoteChange, VoteKey, VoteSnapshot};

use crate::{VoteRepository, VoteRepositoryError};

/// Vote records held in process memory.
///
/// Every write is published as a [`VoteChange`] on the channel returned by
/// [`InMemoryVoteRepository::new`]. The change is sent while the write lock is
/// held, so changes to the same record reach the receiver in commit order.
pub struct InMemoryVoteRepository {
    votes: RwLock<HashMap<VoteKey, VoteSnapshot>>,
    changes: mpsc::UnboundedSender<VoteChange>,
    next_change_id: AtomicI64,
}

impl InMemoryVoteRepository {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VoteChange>) {
        let (changes, receiver) = mpsc::unbounded_channel();
        let repository = Self {
            votes: RwLock::new(HashMap::new()),
            changes,
            next_change_id: AtomicI64::new(1),
        };
        (repository, receiver)
    }

    fn publish(&self, path: String, before: Option<VoteSnapshot>, after: Option<VoteSnapshot>) {
        let id = self.next_change_id.fetch_add(1, Ordering::SeqCst);
        if self.changes.send(VoteChange::new(id, path, before, after)).is_err() {
            debug!(change_id = id, "No listener for vote changes, dropping change");
        }
    }
}

#[async_trait]
impl VoteRepository for InMemoryVoteRepository {
    async fn put_vote(&self, key: &VoteKey, liked: bool) -> Result<(), VoteRepositoryError> {
        let mut votes = self.votes.write().unwrap_or_else(|e| e.into_inner());
        let after = VoteSnapshot { liked };
        let before = votes.insert(key.clone(), after);
        self.publish(key.path(), before, Some(after));
        Ok(())
    }

    async fn delete_vote(&self, key: &VoteKey) -> Result<bool, VoteRepositoryError> {
        let mut votes = self.votes.write().unwrap_or_else(|e| e.into_inner());
        match votes.remove(key) {
            Some(removed) => {
                self.publish(key.path(), Some(removed), None);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_vote(&self, key: &VoteKey) -> Result<Option<VoteSnapshot>, VoteRepositoryError> {
        let votes = self.votes.read().unwrap_or_else(|e| e.into_inner());
        Ok(votes.get(key).copied())
    }

    async fn count_liked(&self, aggregate: &AggregateKey) -> Result<i64, VoteRepositoryError> {
        let votes = self.votes.read().unwrap_or_else(|e| e.into_inner());
        let count = votes
            .iter()
            .filter(|(key, vote)| &key.aggregate == aggregate && vote.liked)
            .count();
        Ok(count as i64)
    }
}
