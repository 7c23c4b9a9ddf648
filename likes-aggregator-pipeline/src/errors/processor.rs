//! Error types for the processor module of the Likes Aggregator Pipeline.
//! Defines the errors that can occur while turning a vote change into an
//! aggregate delta.
use likes_aggregator_shared::types::TemplateError;
use thiserror::Error;

/// Represents errors that can occur within the vote change processor.
///
/// Every variant describes a change that can never be applied; the change is
/// skipped rather than retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("Invalid item key in {path}: {reason}")]
    InvalidKey { path: String, reason: String },
    #[error("Invalid date in {path}: {reason}")]
    InvalidDate { path: String, reason: String },
    #[error("Cannot build aggregate path for {path}: {source}")]
    AggregatePath {
        path: String,
        #[source]
        source: TemplateError,
    },
}
