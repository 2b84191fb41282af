//! Work-stealing job distribution across interchangeable LLM platforms.
//!
//! This module provides the concurrency core of kwforge:
//!
//! - **TaskPool**: shared in-process queue all platform workers pull from
//! - **PlatformWorker**: one async task per configured platform
//! - **Aggregator**: terminal outcomes, per-platform counters, drain barrier
//! - **Coordinator**: seeds the pool, spawns workers, awaits the drain
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!                      │ Coordinator  │
//!                      │ (seeds pool) │
//!                      └──────┬───────┘
//!                             │
//!                      ┌──────▼───────┐
//!                      │   TaskPool   │◄─── failed items re-enqueued
//!                      └──────┬───────┘
//!                             │
//!         ┌───────────────────┼───────────────────┐
//!         │                   │                   │
//!         ▼                   ▼                   ▼
//!    ┌─────────┐         ┌─────────┐         ┌─────────┐
//!    │Worker(A)│         │Worker(B)│         │Worker(N)│
//!    └────┬────┘         └────┬────┘         └────┬────┘
//!         └───────────────────┼───────────────────┘
//!                             ▼
//!                      ┌──────────────┐
//!                      │  Aggregator  │
//!                      └──────────────┘
//! ```
//!
//! Every work item carries the set of platforms that already failed it. A
//! failed item is re-enqueued for any *other* platform to pick up; once every
//! platform has failed it, the item becomes a terminal `Outcome::Exhausted`.
//! A platform never attempts the same item twice.
//!
//! # Drain barrier
//!
//! Queue emptiness is not a completion signal: a worker mid-attempt may still
//! re-enqueue its item after the pool was observed empty. The batch is done
//! only when the count of items without a terminal outcome reaches zero. The
//! `Aggregator` owns that count; workers and the `Coordinator` both block on
//! it rather than on the queue.
//!
//! # Example
//!
//! ```rust,ignore
//! use kwforge::dispatch::{Capability, Coordinator, DispatchConfig, Platform};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let platforms = vec![
//!     Platform::new("moonshot", Arc::new(extractor_a)),
//!     Platform::new("zhipu", Arc::new(extractor_b)),
//! ];
//!
//! let config = DispatchConfig::default()
//!     .with_call_timeout(Duration::from_secs(90))
//!     .with_batch_timeout(Duration::from_secs(3600));
//!
//! let report = Coordinator::with_config(platforms, config).run(records).await?;
//! for outcome in &report.outcomes {
//!     // outcomes are sorted by original input position
//! }
//! ```

pub mod aggregator;
pub mod capability;
pub mod coordinator;
pub mod item;
pub mod pool;
mod worker;

// Re-export main types for convenience
pub use aggregator::{Aggregator, BatchStats, PlatformStats};
pub use capability::{Capability, CapabilityError, Platform};
pub use coordinator::{BatchReport, Coordinator, DispatchConfig, DispatchError};
pub use item::{Outcome, WorkItem};
pub use pool::TaskPool;
