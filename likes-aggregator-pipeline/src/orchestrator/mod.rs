//! This module defines the `Orchestrator` responsible for coordinating the
//! likes aggregation pipeline.
//! It integrates the consumer, processor, and loader components to manage the
//! flow of vote changes from the change feed to the aggregate counters.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{ConsumeVoteChanges, StreamMessage};
use crate::errors::OrchestratorError;
use crate::loader::AggregateLoader;
use crate::processor::ProcessVoteChanges;
use likes_aggregator_shared::types::{ChangeId, VoteChange};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Number of change batches buffered between the consumer and the orchestrator.
    pub channel_buffer_size: usize,
    /// Maximum number of changes processed at the same time.
    pub max_concurrency: usize,
    /// Interval between two progress log lines.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 4,
            max_concurrency: 16,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Counters of the work done since startup.
#[derive(Debug, Default)]
pub struct PipelineStats {
    changes_processed: AtomicU64,
    changes_failed: AtomicU64,
    deltas_applied: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub changes_processed: u64,
    pub changes_failed: u64,
    pub deltas_applied: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            changes_processed: self.changes_processed.load(Ordering::Relaxed),
            changes_failed: self.changes_failed.load(Ordering::Relaxed),
            deltas_applied: self.deltas_applied.load(Ordering::Relaxed),
        }
    }
}

/// `Orchestrator` is responsible for coordinating the consumption, processing,
/// and loading of vote changes.
///
/// Changes of one batch are grouped by vote record. Records are processed
/// concurrently (bounded by `max_concurrency`), while the changes of one record
/// are applied one after the other in feed order. Each change is acknowledged
/// once its deltas are committed, or negatively acknowledged so that the feed
/// delivers it again. After a failure the later changes of the same record are
/// negatively acknowledged without being applied, so they never overtake it.
pub struct Orchestrator {
    consumer: Arc<dyn ConsumeVoteChanges>,
    processor: Arc<dyn ProcessVoteChanges>,
    loader: AggregateLoader,
    config: OrchestratorConfig,
    stats: Arc<PipelineStats>,
}

impl Orchestrator {
    pub fn new(
        consumer: Arc<dyn ConsumeVoteChanges>,
        processor: Arc<dyn ProcessVoteChanges>,
        loader: AggregateLoader,
    ) -> Self {
        Self::with_config(consumer, processor, loader, OrchestratorConfig::default())
    }

    pub fn with_config(
        consumer: Arc<dyn ConsumeVoteChanges>,
        processor: Arc<dyn ProcessVoteChanges>,
        loader: AggregateLoader,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            consumer,
            processor,
            loader,
            config,
            stats: Arc::new(PipelineStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the pipeline until the feed ends or the process receives Ctrl-C.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        info!("Starting likes aggregator orchestrator");

        let (event_tx, mut event_rx) = mpsc::channel::<StreamMessage>(self.config.channel_buffer_size.max(1));
        let (ack_tx, ack_rx) = mpsc::unbounded_channel::<StreamMessage>();

        let (shutdown_tx, consumer_shutdown) = broadcast::channel::<()>(1);

        let consumer = Arc::clone(&self.consumer);
        let consumer_handle =
            tokio::spawn(async move { consumer.run(event_tx, ack_rx, consumer_shutdown).await });

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut previous = self.stats.snapshot();
        let mut previous_time = Instant::now();

        loop {
            tokio::select! {
                message = event_rx.recv() => {
                    match message {
                        Some(StreamMessage::Changes(changes)) => {
                            debug!(change_count = changes.len(), "Received vote changes from consumer");
                            self.process_changes(changes, &ack_tx).await;
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            warn!("Received acknowledgment on event channel (should be on ack channel)");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = progress_timer.tick() => {
                    let current = self.stats.snapshot();
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(previous_time).as_secs_f64();
                    let changes_per_sec = if elapsed_secs > 0.0 {
                        current.changes_processed.saturating_sub(previous.changes_processed) as f64 / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        changes_processed = current.changes_processed,
                        changes_failed = current.changes_failed,
                        deltas_applied = current.deltas_applied,
                        changes_per_sec = format!("{:.2}", changes_per_sec),
                        "Processing progress"
                    );
                    previous = current;
                    previous_time = now;
                }
            }
        }

        // Stops the consumer if it is still running; it settles the acks it has
        // already received before returning.
        let _ = shutdown_tx.send(());
        drop(ack_tx);
        drop(event_rx);

        let consumer_result = match consumer_handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Consumer task failed");
                Ok(())
            }
        };

        let totals = self.stats.snapshot();
        info!(
            changes_processed = totals.changes_processed,
            changes_failed = totals.changes_failed,
            deltas_applied = totals.deltas_applied,
            "Orchestrator shutdown complete"
        );
        consumer_result.map_err(OrchestratorError::from)
    }

    /// Processes a batch, one vote record at a time per task, and acknowledges
    /// each change as soon as it is settled.
    async fn process_changes(&self, changes: Vec<VoteChange>, ack_tx: &mpsc::UnboundedSender<StreamMessage>) {
        futures::stream::iter(group_by_record(changes))
            .for_each_concurrent(self.config.max_concurrency.max(1), |record_changes| {
                self.process_record_changes(record_changes, ack_tx)
            })
            .await;
    }

    /// Applies the changes of one vote record in order. Once one of them fails,
    /// the remaining ones are negatively acknowledged without being applied.
    async fn process_record_changes(
        &self,
        changes: Vec<VoteChange>,
        ack_tx: &mpsc::UnboundedSender<StreamMessage>,
    ) {
        let mut failed: Option<ChangeId> = None;

        for change in changes {
            let id = change.id;
            let ack = match failed {
                Some(failed_id) => {
                    debug!(change_id = id, failed_change_id = failed_id, "Holding back vote change behind a failed one");
                    StreamMessage::nack(id, format!("earlier change {failed_id} of the same vote record failed"))
                }
                None => match self.process_change(&change).await {
                    Ok(()) => StreamMessage::ack(id),
                    Err(e) => {
                        error!(change_id = id, error = %e, "Failed to apply vote change, it will be redelivered");
                        self.stats.changes_failed.fetch_add(1, Ordering::Relaxed);
                        failed = Some(id);
                        StreamMessage::nack(id, e.to_string())
                    }
                },
            };
            if ack_tx.send(ack).is_err() {
                warn!(change_id = id, "Consumer is gone, acknowledgment dropped");
            }
        }
    }

    /// Runs one change through the listener and the updater.
    pub async fn process_change(&self, change: &VoteChange) -> Result<(), OrchestratorError> {
        let deltas = self.processor.process(change);
        self.loader.apply_all(&deltas).await?;
        self.stats.deltas_applied.fetch_add(deltas.len() as u64, Ordering::Relaxed);
        self.stats.changes_processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Splits a batch into per-record lists, each sorted by change id. Records keep
/// the order of their first change in the batch.
fn group_by_record(changes: Vec<VoteChange>) -> Vec<Vec<VoteChange>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<VoteChange>> = Vec::new();

    for change in changes {
        match index.get(&change.path) {
            Some(&position) => groups[position].push(change),
            None => {
                index.insert(change.path.clone(), groups.len());
                groups.push(vec![change]);
            }
        }
    }
    for group in &mut groups {
        group.sort_by_key(|change| change.id);
    }
    groups
}
