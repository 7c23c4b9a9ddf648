use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the sub-collection holding the per-user votes of an aggregate document.
pub const VOTES_COLLECTION: &str = "votes";

/// Identity of one aggregate counter document, e.g. `likes/moqueca` or
/// `likes_daily/2025-03-10/moqueca`.
///
/// Keys are produced by rendering a route's aggregate template from validated
/// path parameters, so each key resolves to exactly one counter document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateKey(String);

impl AggregateKey {
    pub fn from_path(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    /// The vote record of `user_id` under this aggregate.
    pub fn vote(&self, user_id: impl Into<String>) -> VoteKey {
        VoteKey {
            aggregate: self.clone(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one user's vote record: `{aggregate}/votes/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteKey {
    pub aggregate: AggregateKey,
    pub user_id: String,
}

impl VoteKey {
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.aggregate, VOTES_COLLECTION, self.user_id)
    }
}
