use serde::{Deserialize, Serialize};

/// Identifier of one change-feed delivery, used for acknowledgement.
pub type ChangeId = i64;

/// The state of a vote record at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSnapshot {
    pub liked: bool,
}

impl VoteSnapshot {
    pub fn liked() -> Self {
        Self { liked: true }
    }

    pub fn unliked() -> Self {
        Self { liked: false }
    }
}

/// One observed transition of a vote record.
///
/// `before` is `None` when the record was created, `after` is `None` when it was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteChange {
    pub id: ChangeId,
    /// Full document path of the vote record, e.g. `likes/moqueca/votes/uid-1`.
    pub path: String,
    pub before: Option<VoteSnapshot>,
    pub after: Option<VoteSnapshot>,
}

impl VoteChange {
    pub fn new(
        id: ChangeId,
        path: impl Into<String>,
        before: Option<VoteSnapshot>,
        after: Option<VoteSnapshot>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            before,
            after,
        }
    }

    pub fn created(id: ChangeId, path: impl Into<String>, after: VoteSnapshot) -> Self {
        Self::new(id, path, None, Some(after))
    }

    pub fn updated(
        id: ChangeId,
        path: impl Into<String>,
        before: VoteSnapshot,
        after: VoteSnapshot,
    ) -> Self {
        Self::new(id, path, Some(before), Some(after))
    }

    pub fn deleted(id: ChangeId, path: impl Into<String>, before: VoteSnapshot) -> Self {
        Self::new(id, path, Some(before), None)
    }
}
