use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The denormalized like counter of one aggregate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesAggregate {
    /// Number of likes, never negative.
    pub count: i64,
    /// Commit time of the last delta application.
    pub updated_at: DateTime<Utc>,
}

impl LikesAggregate {
    /// Computes the next counter value, clamped at zero.
    ///
    /// Returns the new count and whether the floor had to be applied.
    pub fn clamped_next(current: i64, delta: i64) -> (i64, bool) {
        let raw = current.saturating_add(delta);
        if raw < 0 { (0, true) } else { (raw, false) }
    }
}
