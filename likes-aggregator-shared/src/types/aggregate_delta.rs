use serde::{Deserialize, Serialize};

use crate::types::AggregateKey;

/// A signed change to apply to one aggregate counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDelta {
    pub key: AggregateKey,
    pub delta: i64,
}
