//! Likes Aggregator Main Entry Point
//!
//! Keeps the per-item like counters in step with the per-user vote records by
//! consuming the vote change feed and applying signed deltas to the counters.

use dotenv::dotenv;
use likes_aggregator::{Dependencies, IndexingError, Settings};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// `LOG_FORMAT=json` switches from pretty console output to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("likes_aggregator=info,likes_aggregator_pipeline=info,likes_aggregator_repository=info")
    });

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "likes-aggregator",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv().ok();
    init_tracing();

    info!("Starting likes aggregator");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };

    let dependencies = match Dependencies::new(&settings).await {
        Ok(dependencies) => {
            info!("Dependencies initialized successfully");
            dependencies
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match dependencies.orchestrator.run().await {
        Ok(()) => {
            info!("Likes aggregator stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Likes aggregator failed");
            Err(e.into())
        }
    }
}
