//! Per-platform worker loop.
//!
//! One worker task runs per configured platform. Each loop iteration pulls
//! one item from the shared pool, skips items its own platform already
//! failed, and invokes the platform capability under the per-call timeout.
//! Failures append the platform id to the item's ledger and re-enqueue it
//! for the remaining platforms; once every platform has failed an item the
//! worker records it as exhausted.
//!
//! A worker never exits on an empty pool alone. An in-flight item on another
//! worker may still come back, so the pool can refill after being observed
//! empty. Instead the worker parks until either a new item arrives or the
//! aggregator reports the batch drained.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::aggregator::Aggregator;
use super::capability::{CapabilityError, Platform};
use super::item::{Outcome, WorkItem};
use super::pool::TaskPool;

pub(crate) struct PlatformWorker<T, R> {
    platform: Platform<T, R>,
    pool: Arc<TaskPool<T>>,
    aggregator: Arc<Aggregator<T, R>>,
    /// Total number of configured platforms; an item with this many ledger
    /// entries has nowhere left to go.
    platform_count: usize,
    call_timeout: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

impl<T, R> PlatformWorker<T, R>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(
        platform: Platform<T, R>,
        pool: Arc<TaskPool<T>>,
        aggregator: Arc<Aggregator<T, R>>,
        platform_count: usize,
        call_timeout: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            platform,
            pool,
            aggregator,
            platform_count,
            call_timeout,
            shutdown_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        let platform_id = self.platform.id().to_string();
        info!(platform = %platform_id, "Platform worker started");

        loop {
            // Check for shutdown signal
            match self.shutdown_rx.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Closed) => {
                    info!(platform = %platform_id, "Platform worker shutting down");
                    break;
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(broadcast::error::TryRecvError::Empty) => {}
            }

            let item = match self.pool.try_take() {
                Some(item) => item,
                None => {
                    if self.aggregator.is_drained() {
                        break;
                    }
                    // Items may still be in flight on other workers. Park
                    // until the pool refills or the batch drains.
                    tokio::select! {
                        _ = self.pool.wait_for_item() => {}
                        _ = self.aggregator.wait_drained() => break,
                        _ = self.shutdown_rx.recv() => {
                            info!(platform = %platform_id, "Platform worker shutting down");
                            break;
                        }
                    }
                    continue;
                }
            };

            if item.was_attempted(&platform_id) {
                // Only other platforms may retry this item. Put it back and
                // yield so a sibling gets a chance to take it before we loop.
                debug!(
                    platform = %platform_id,
                    index = item.index(),
                    "Skipping item this platform already attempted"
                );
                self.pool.put(item);
                tokio::task::yield_now().await;
                continue;
            }

            self.attempt(item, &platform_id).await;
        }

        info!(platform = %platform_id, "Platform worker finished");
    }

    async fn attempt(&self, mut item: WorkItem<T>, platform_id: &str) {
        let index = item.index();
        debug!(platform = %platform_id, index, "Attempting item");

        let started = Instant::now();
        let result = timeout(
            self.call_timeout,
            self.platform.capability().invoke(item.payload()),
        )
        .await;
        let duration = started.elapsed();

        let error = match result {
            Ok(Ok(output)) => {
                debug!(
                    platform = %platform_id,
                    index,
                    duration_ms = duration.as_millis() as u64,
                    "Item succeeded"
                );
                let (index, payload, _, _) = item.into_parts();
                self.aggregator.record(Outcome::Success {
                    index,
                    platform_id: platform_id.to_string(),
                    payload,
                    result: output,
                    duration,
                });
                return;
            }
            Ok(Err(error)) => error,
            Err(_) => CapabilityError::Timeout(self.call_timeout),
        };

        warn!(
            platform = %platform_id,
            index,
            error = %error,
            "Item attempt failed"
        );
        self.aggregator.note_failed_attempt(platform_id, duration);
        item.record_failure(platform_id, error);

        if item.attempts() < self.platform_count {
            // Another platform can still try it.
            self.pool.put(item);
        } else {
            let (index, payload, attempted, last_error) = item.into_parts();
            warn!(
                platform = %platform_id,
                index,
                attempts = attempted.len(),
                "Item exhausted all platforms"
            );
            self.aggregator.record(Outcome::Exhausted {
                index,
                payload,
                attempted,
                // record_failure always sets the error before we get here.
                last_error: last_error
                    .unwrap_or_else(|| CapabilityError::Permanent("attempt failed".to_string())),
            });
        }
    }
}
