//! The backend capability seam between the dispatch core and real platforms.
//!
//! The core schedules opaque payloads against anything implementing
//! [`Capability`]; it never inspects payloads or results. Production code
//! binds one `extract::PlatformExtractor` per LLM platform; tests bind mocks.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single capability invocation.
///
/// The scheduler treats transient and permanent failures identically (retry
/// on another platform while any remain); the distinction is preserved for
/// reporting.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// Recoverable failure: rate limit, network error, server error.
    #[error("transient backend failure: {0}")]
    Transient(String),

    /// Unrecoverable failure: the backend answered but the answer is unusable.
    #[error("permanent backend failure: {0}")]
    Permanent(String),

    /// The invocation exceeded the per-call timeout.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

/// A backend extraction capability, implemented once per platform.
///
/// Implementations must be safe to call concurrently with other platforms'
/// capabilities. The one-worker-per-platform model guarantees at most one
/// in-flight call per capability.
#[async_trait]
pub trait Capability<T, R>: Send + Sync {
    /// Invoke the backend with one payload.
    async fn invoke(&self, payload: &T) -> Result<R, CapabilityError>;
}

/// One interchangeable backend endpoint: a stable id bound to a capability.
///
/// Constructed once before the coordinator runs and read-only for the
/// duration of a batch.
pub struct Platform<T, R> {
    id: String,
    capability: Arc<dyn Capability<T, R>>,
}

impl<T, R> Platform<T, R> {
    /// Create a platform binding.
    pub fn new(id: impl Into<String>, capability: Arc<dyn Capability<T, R>>) -> Self {
        Self {
            id: id.into(),
            capability,
        }
    }

    /// Stable platform identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The bound capability.
    pub fn capability(&self) -> &Arc<dyn Capability<T, R>> {
        &self.capability
    }
}

impl<T, R> Clone for Platform<T, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            capability: Arc::clone(&self.capability),
        }
    }
}

impl<T, R> std::fmt::Debug for Platform<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").field("id", &self.id).finish()
    }
}
