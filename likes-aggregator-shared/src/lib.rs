//! # Likes Aggregator Shared
//! This crate defines shared data structures and types used across the likes aggregator.
//! It includes validated vote keys, vote snapshots and change events, aggregate documents,
//! signed deltas and the key-path templates used to route vote changes.
pub mod types;
