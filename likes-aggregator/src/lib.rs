//! Likes Aggregator Library
//!
//! This library provides the runnable likes aggregator: configuration loading,
//! error handling, route registration and dependency wiring.

pub mod config;
pub mod errors;

pub use config::{Dependencies, Settings};
pub use errors::IndexingError;
