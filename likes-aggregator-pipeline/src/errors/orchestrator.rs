//! Error types for the orchestrator module of the Likes Aggregator Pipeline.
//! Defines specific errors that can occur during the orchestration process.
use thiserror::Error;
use crate::errors::consumer::ConsumerError;
use crate::errors::loader::LoaderError;

/// Represents errors that can occur within the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
}
