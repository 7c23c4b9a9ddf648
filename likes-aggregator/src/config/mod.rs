//! Configuration module for the Likes Aggregator.
//! Defines and manages application-wide settings and dependencies.
mod dependencies;
mod routes;
mod settings;

pub use dependencies::Dependencies;
pub use routes::build_processor;
pub use settings::Settings;
