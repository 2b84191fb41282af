//! Shared in-process task pool.
//!
//! A multi-producer/multi-consumer queue of work items. `try_take` never
//! blocks: emptiness is a normal outcome that tells a worker to consult the
//! drain barrier. Dequeue order is unspecified (FIFO happens to be used but
//! is not part of the contract); delivery is exactly-once per enqueue.
//!
//! The queue is deliberately not durable — batch state does not survive a
//! process restart.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

use super::item::WorkItem;

/// Concurrency-safe pool of pending work items.
pub struct TaskPool<T> {
    queue: Mutex<VecDeque<WorkItem<T>>>,
    available: Notify,
}

impl<T> TaskPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    /// Insert a work item and wake one parked worker.
    pub fn put(&self, item: WorkItem<T>) {
        self.queue
            .lock()
            .expect("task pool mutex poisoned")
            .push_back(item);
        self.available.notify_one();
    }

    /// Remove and return one item without blocking, or `None` if empty.
    pub fn try_take(&self) -> Option<WorkItem<T>> {
        self.queue
            .lock()
            .expect("task pool mutex poisoned")
            .pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("task pool mutex poisoned").len()
    }

    /// Whether the pool is currently empty.
    ///
    /// Emptiness alone never means the batch is finished; see the drain
    /// barrier on [`super::Aggregator`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until an item is enqueued.
    ///
    /// A stored permit from an earlier `put` is consumed immediately, so a
    /// `put` racing with a worker's empty read is never lost.
    pub(crate) async fn wait_for_item(&self) {
        self.available.notified().await;
    }

    /// Remove and return all remaining items.
    ///
    /// Used by the coordinator after a batch deadline to account for items
    /// that never reached a terminal state.
    pub fn drain(&self) -> Vec<WorkItem<T>> {
        self.queue
            .lock()
            .expect("task pool mutex poisoned")
            .drain(..)
            .collect()
    }
}

impl<T> Default for TaskPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
