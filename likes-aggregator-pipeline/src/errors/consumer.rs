//! Error types for the consumer module of the Likes Aggregator Pipeline.
//! Defines the errors that can occur while reading vote changes from a feed.
use thiserror::Error;
use likes_aggregator_repository::ChangeFeedError;

/// Represents errors that can occur within a vote change consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Change feed error: {0}")]
    ChangeFeed(#[from] ChangeFeedError),
    #[error("Error sending message through channel: {0}")]
    ChannelSend(String),
}
