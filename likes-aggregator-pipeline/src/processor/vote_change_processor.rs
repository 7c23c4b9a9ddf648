use std::sync::Arc;

use tracing::{debug, warn};

use crate::processor::{HandleVoteChange, ProcessVoteChanges, VoteRoute};
use likes_aggregator_shared::types::{AggregateDelta, VoteChange};

/// `VoteChangeProcessor` dispatches vote changes to the handler of the route
/// their path belongs to.
///
/// A change may match several registered routes; each match yields at most one
/// delta. Changes that match no route are ignored.
pub struct VoteChangeProcessor {
    handler_registry: Vec<(VoteRoute, Arc<dyn HandleVoteChange>)>,
}

impl VoteChangeProcessor {
    pub fn new() -> Self {
        Self {
            handler_registry: Vec::new(),
        }
    }

    /// Registers `handler` for every vote record matched by `route`.
    pub fn register_handler(&mut self, route: VoteRoute, handler: Arc<dyn HandleVoteChange>) {
        self.handler_registry.push((route, handler));
    }

    pub fn routes(&self) -> impl Iterator<Item = &VoteRoute> {
        self.handler_registry.iter().map(|(route, _)| route)
    }
}

impl Default for VoteChangeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessVoteChanges for VoteChangeProcessor {
    fn process(&self, change: &VoteChange) -> Vec<AggregateDelta> {
        let mut deltas = Vec::new();
        let mut matched = false;

        for (route, handler) in &self.handler_registry {
            let Some(params) = route.matches(&change.path) else {
                continue;
            };
            matched = true;

            match handler.handle(route, &params, change) {
                Ok(Some(delta)) => {
                    debug!(
                        change_id = change.id,
                        route = route.name(),
                        aggregate = %delta.key,
                        delta = delta.delta,
                        "Computed aggregate delta"
                    );
                    deltas.push(delta);
                }
                Ok(None) => {
                    debug!(change_id = change.id, route = route.name(), "Vote change does not move the counter");
                }
                Err(e) => {
                    warn!(change_id = change.id, route = route.name(), error = %e, "Skipping invalid vote change");
                }
            }
        }

        if !matched {
            debug!(change_id = change.id, path = %change.path, "Vote change matches no route");
        }
        deltas
    }
}
