//! Outcome collection, per-platform counters and the drain barrier.
//!
//! The aggregator is the single authority on batch completion. It is seeded
//! with the input item count; every recorded terminal outcome decrements the
//! pending counter, and the batch is drained exactly when that counter hits
//! zero. Workers and the coordinator block on [`Aggregator::wait_drained`]
//! rather than on queue emptiness, which can be observed while an item is
//! still in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;

use super::item::Outcome;

/// Per-platform attempt counters for one batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformStats {
    /// Successful invocations credited to this platform.
    pub successes: u64,
    /// Failed invocations (including timeouts) by this platform.
    pub failures: u64,
    /// Total wall time spent in this platform's invocations.
    pub total_duration: Duration,
}

impl PlatformStats {
    /// Mean duration of this platform's invocations, or zero with no attempts.
    pub fn avg_duration(&self) -> Duration {
        let attempts = self.successes + self.failures;
        if attempts == 0 {
            return Duration::ZERO;
        }
        self.total_duration / attempts as u32
    }
}

/// Batch-level summary assembled by the coordinator once a run finishes.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    /// Number of input items.
    pub total_items: usize,
    /// Items that reached `Outcome::Success`.
    pub successes: usize,
    /// Items that every platform attempted and failed.
    pub exhausted: usize,
    /// Items cut off by the batch deadline.
    pub expired: usize,
    /// Wall time of the whole batch.
    pub elapsed: Duration,
    /// Per-platform attempt counters.
    pub platforms: HashMap<String, PlatformStats>,
}

impl BatchStats {
    /// Fraction of input items that succeeded, in `[0.0, 1.0]`.
    pub fn success_rate(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        self.successes as f64 / self.total_items as f64
    }
}

/// Collects terminal outcomes and tracks how many items are still live.
pub struct Aggregator<T, R> {
    outcomes: Mutex<Vec<Outcome<T, R>>>,
    stats: Mutex<HashMap<String, PlatformStats>>,
    pending: AtomicUsize,
    drained: Notify,
}

impl<T, R> Aggregator<T, R> {
    /// Create an aggregator expecting `total` terminal outcomes.
    pub fn new(total: usize) -> Self {
        Self {
            outcomes: Mutex::new(Vec::with_capacity(total)),
            stats: Mutex::new(HashMap::new()),
            pending: AtomicUsize::new(total),
            drained: Notify::new(),
        }
    }

    /// Record a terminal outcome and retire the item from the pending count.
    ///
    /// Successful outcomes also credit the winning platform's counters.
    /// Failed attempts along the way are credited separately through
    /// [`Aggregator::note_failed_attempt`] at the time they happen.
    pub fn record(&self, outcome: Outcome<T, R>) {
        if let Outcome::Success {
            platform_id,
            duration,
            ..
        } = &outcome
        {
            let mut stats = self.stats.lock().expect("aggregator stats mutex poisoned");
            let entry = stats.entry(platform_id.clone()).or_default();
            entry.successes += 1;
            entry.total_duration += *duration;
        }

        self.outcomes
            .lock()
            .expect("aggregator outcomes mutex poisoned")
            .push(outcome);

        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Credit one failed invocation to a platform's counters.
    ///
    /// Failed attempts do not retire the item; it stays pending until some
    /// platform succeeds, every platform has failed it, or the deadline fires.
    pub fn note_failed_attempt(&self, platform_id: &str, duration: Duration) {
        let mut stats = self.stats.lock().expect("aggregator stats mutex poisoned");
        let entry = stats.entry(platform_id.to_string()).or_default();
        entry.failures += 1;
        entry.total_duration += duration;
    }

    /// Number of items with no terminal outcome yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether every input item has a terminal outcome.
    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    /// Wait until the pending count reaches zero.
    ///
    /// Registers for notification before re-checking the count, so a record
    /// landing between the check and the await is never missed.
    pub async fn wait_drained(&self) {
        loop {
            if self.is_drained() {
                return;
            }
            let notified = self.drained.notified();
            if self.is_drained() {
                return;
            }
            notified.await;
        }
    }

    /// Take all recorded outcomes, sorted by original input position.
    pub fn take_outcomes(&self) -> Vec<Outcome<T, R>> {
        let mut outcomes = std::mem::take(
            &mut *self
                .outcomes
                .lock()
                .expect("aggregator outcomes mutex poisoned"),
        );
        outcomes.sort_by_key(|o| o.index());
        outcomes
    }

    /// Snapshot of the per-platform counters.
    pub fn platform_stats(&self) -> HashMap<String, PlatformStats> {
        self.stats
            .lock()
            .expect("aggregator stats mutex poisoned")
            .clone()
    }
}
