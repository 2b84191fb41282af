//! Batch lifecycle: seed, spawn, drain, report.
//!
//! The coordinator owns one batch end to end. It seeds the pool with every
//! input payload, spawns one worker per platform, and then waits on the
//! aggregator's drain barrier rather than on queue emptiness. With a batch
//! deadline configured, items still live when the deadline fires become
//! `Outcome::Expired` instead of blocking the run forever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::aggregator::{Aggregator, BatchStats};
use super::capability::Platform;
use super::item::{Outcome, WorkItem};
use super::pool::TaskPool;
use super::worker::PlatformWorker;

/// Configuration errors surfaced before any work starts.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A batch cannot run without at least one platform.
    #[error("No platforms configured; at least one is required")]
    NoPlatforms,
}

/// Tunables for one batch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on a single capability invocation.
    pub call_timeout: Duration,
    /// Optional wall-clock budget for the whole batch. `None` means the run
    /// only ends when every item reaches success or exhaustion.
    pub batch_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(120),
            batch_timeout: None,
        }
    }
}

impl DispatchConfig {
    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the whole-batch deadline.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }
}

/// Everything a finished batch produced.
#[derive(Debug)]
pub struct BatchReport<T, R> {
    /// One terminal outcome per input item, sorted by input position.
    pub outcomes: Vec<Outcome<T, R>>,
    /// Batch and per-platform counters.
    pub stats: BatchStats,
}

/// Runs batches of payloads across a fixed set of platforms.
pub struct Coordinator<T, R> {
    platforms: Vec<Platform<T, R>>,
    config: DispatchConfig,
}

impl<T, R> Coordinator<T, R>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Create a coordinator with default tunables.
    pub fn new(platforms: Vec<Platform<T, R>>) -> Self {
        Self::with_config(platforms, DispatchConfig::default())
    }

    /// Create a coordinator with explicit tunables.
    pub fn with_config(platforms: Vec<Platform<T, R>>, config: DispatchConfig) -> Self {
        Self { platforms, config }
    }

    /// Run one batch to completion.
    ///
    /// Returns one outcome per payload, in payload order. Fails fast with
    /// [`DispatchError::NoPlatforms`] when no platform is configured, even
    /// for an empty batch.
    pub async fn run(&self, payloads: Vec<T>) -> Result<BatchReport<T, R>, DispatchError> {
        if self.platforms.is_empty() {
            return Err(DispatchError::NoPlatforms);
        }

        let total = payloads.len();
        let started = Instant::now();
        info!(
            items = total,
            platforms = self.platforms.len(),
            "Starting batch dispatch"
        );

        let pool = Arc::new(TaskPool::new());
        let aggregator: Arc<Aggregator<T, R>> = Arc::new(Aggregator::new(total));
        for (index, payload) in payloads.into_iter().enumerate() {
            pool.put(WorkItem::new(index, payload));
        }

        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::with_capacity(self.platforms.len());
        for platform in &self.platforms {
            let worker = PlatformWorker::new(
                platform.clone(),
                Arc::clone(&pool),
                Arc::clone(&aggregator),
                self.platforms.len(),
                self.config.call_timeout,
                shutdown_tx.subscribe(),
            );
            handles.push(tokio::spawn(worker.run()));
        }

        let deadline_fired = match self.config.batch_timeout {
            Some(budget) => tokio::time::timeout(budget, aggregator.wait_drained())
                .await
                .is_err(),
            None => {
                aggregator.wait_drained().await;
                false
            }
        };

        if deadline_fired {
            warn!(
                pending = aggregator.pending(),
                "Batch deadline reached, stopping workers"
            );
            // Workers also exit on their own when the pool stays empty and
            // the last live item expires, but the signal ends them promptly.
            let _ = shutdown_tx.send(());
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {}", e);
            }
        }

        // Workers always dispose of the item they hold before exiting, so
        // after the joins every non-terminal item sits in the pool.
        for item in pool.drain() {
            let (index, payload, attempted, _) = item.into_parts();
            aggregator.record(Outcome::Expired {
                index,
                payload,
                attempted,
            });
        }

        let outcomes = aggregator.take_outcomes();
        let mut successes = 0;
        let mut exhausted = 0;
        let mut expired = 0;
        for outcome in &outcomes {
            match outcome {
                Outcome::Success { .. } => successes += 1,
                Outcome::Exhausted { .. } => exhausted += 1,
                Outcome::Expired { .. } => expired += 1,
            }
        }

        let stats = BatchStats {
            total_items: total,
            successes,
            exhausted,
            expired,
            elapsed: started.elapsed(),
            platforms: aggregator.platform_stats(),
        };

        info!(
            items = total,
            successes,
            exhausted,
            expired,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Batch dispatch finished"
        );

        Ok(BatchReport { outcomes, stats })
    }
}
