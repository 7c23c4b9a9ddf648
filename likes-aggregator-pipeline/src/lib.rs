//! # Likes Aggregator Pipeline
//! This crate defines the core traits and modules that keep the like counters in
//! step with the per-user vote records.
//! It includes modules for consuming vote changes, turning them into aggregate
//! deltas, applying those deltas and orchestrating the whole flow, along with
//! error handling.
pub mod consumer;
pub mod loader;
pub mod processor;
pub mod orchestrator;

pub mod errors;
