//! Processor module: the vote change listener.
//!
//! Turns a single vote record transition into the signed delta that has to be
//! applied to its aggregate counter.
mod likes_handler;
mod route;
mod vote_change_processor;

pub use likes_handler::{LikesHandler, compute_delta};
pub use route::{DATE_PARAM, ITEM_KEY_PARAM, USER_ID_PARAM, VoteRoute};
pub use vote_change_processor::VoteChangeProcessor;

use crate::errors::ProcessorError;
use likes_aggregator_shared::types::{AggregateDelta, PathParams, VoteChange};

/// Handles the changes of one kind of vote record.
pub trait HandleVoteChange: Send + Sync {
    /// Computes the delta caused by `change`, whose path matched `route` with
    /// the captured `params`.
    ///
    /// Returns `Ok(None)` when the change does not move the counter.
    fn handle(
        &self,
        route: &VoteRoute,
        params: &PathParams,
        change: &VoteChange,
    ) -> Result<Option<AggregateDelta>, ProcessorError>;
}

pub trait ProcessVoteChanges: Send + Sync {
    fn process(&self, change: &VoteChange) -> Vec<AggregateDelta>;
}
