//! Message types exchanged between a consumer and the orchestrator.
use likes_aggregator_shared::types::{ChangeId, VoteChange};

/// Messages that flow through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// A batch of vote changes, each processed and acknowledged on its own.
    Changes(Vec<VoteChange>),
    /// Outcome of processing one change.
    Acknowledgment {
        id: ChangeId,
        success: bool,
        error: Option<String>,
    },
    /// The feed has no more changes and never will.
    End,
    /// The consumer hit an error; the stream may continue.
    Error(String),
}

impl StreamMessage {
    pub fn ack(id: ChangeId) -> Self {
        Self::Acknowledgment {
            id,
            success: true,
            error: None,
        }
    }

    pub fn nack(id: ChangeId, error: impl Into<String>) -> Self {
        Self::Acknowledgment {
            id,
            success: false,
            error: Some(error.into()),
        }
    }
}
