//! Consumer module for the likes aggregator pipeline.
//!
//! Provides the `ConsumeVoteChanges` trait for reading vote record changes from
//! a change feed. Acts as the entry point for the pipeline, feeding changes to
//! the processing and loading components and settling them once handled.
mod channel_consumer;
mod messages;
mod postgres_consumer;

pub use channel_consumer::ChannelConsumer;
pub use messages::StreamMessage;
pub use postgres_consumer::{PollingConfig, PostgresChangeFeedConsumer};

use crate::errors::ConsumerError;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

/// Trait for feeding vote changes into the pipeline.
///
/// Implementations push `StreamMessage::Changes` batches on `sender` and settle
/// each change when its `StreamMessage::Acknowledgment` arrives on
/// `ack_receiver`. A change that is acknowledged with `success: false` must be
/// delivered again later.
#[async_trait]
pub trait ConsumeVoteChanges: Send + Sync {
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::UnboundedReceiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ConsumerError>;
}
