//! Error types for the Likes Aggregator application.
//! Consolidates the errors that can stop the aggregator, from configuration
//! problems at startup to failures of the running orchestrator.
use likes_aggregator_shared::types::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum IndexingError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid vote route: {0}")]
    Route(#[from] TemplateError),
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] likes_aggregator_pipeline::errors::OrchestratorError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl IndexingError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
