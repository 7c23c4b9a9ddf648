//! Dependency initialization and wiring for the likes aggregator.
use std::sync::Arc;

use tracing::info;

use likes_aggregator_pipeline::consumer::{PollingConfig, PostgresChangeFeedConsumer};
use likes_aggregator_pipeline::loader::AggregateLoader;
use likes_aggregator_pipeline::orchestrator::{Orchestrator, OrchestratorConfig};
use likes_aggregator_repository::postgres::{connect, run_migrations};
use likes_aggregator_repository::{
    ChangeFeedConfig, PostgresAggregateRepository, PostgresChangeFeedRepository, TransactionRetry,
};

use crate::config::{Settings, build_processor};
use crate::errors::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connects to the database, applies pending migrations and wires the
    /// change feed consumer, the vote change processor and the aggregate loader
    /// into an orchestrator.
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            likes_root = %settings.likes_root,
            likes_daily_root = %settings.likes_daily_root,
            daily_likes_enabled = settings.daily_likes_enabled,
            max_concurrency = settings.max_concurrency,
            change_batch_size = settings.change_batch_size,
            "Initializing dependencies"
        );

        let processor = build_processor(settings)?;

        let pool = connect(&settings.database_url, settings.database_max_connections).await?;
        run_migrations(&pool).await?;
        info!("Database connection established and migrations applied");

        let feed = PostgresChangeFeedRepository::new(
            pool.clone(),
            ChangeFeedConfig {
                lease: settings.delivery_lease,
                max_attempts: settings.max_delivery_attempts,
            },
        );
        let consumer = PostgresChangeFeedConsumer::new(
            Arc::new(feed),
            PollingConfig {
                poll_interval: settings.poll_interval,
                batch_size: settings.change_batch_size,
            },
        );

        let aggregates = PostgresAggregateRepository::new(pool, TransactionRetry::new(settings.tx_max_retries));
        let loader = AggregateLoader::new(Arc::new(aggregates));

        let orchestrator = Orchestrator::with_config(
            Arc::new(consumer),
            Arc::new(processor),
            loader,
            OrchestratorConfig {
                max_concurrency: settings.max_concurrency,
                ..OrchestratorConfig::default()
            },
        );

        Ok(Self { orchestrator })
    }
}
