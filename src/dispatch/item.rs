//! Work items and their terminal outcomes.
//!
//! A [`WorkItem`] pairs one input payload with its retry ledger: the set of
//! platforms that already failed it. The ledger grows monotonically and is
//! only ever written by the worker currently holding the item, so it needs no
//! synchronization of its own.

use std::time::Duration;

use super::capability::CapabilityError;

/// One queued unit of work: an input payload plus retry bookkeeping.
#[derive(Debug)]
pub struct WorkItem<T> {
    payload: T,
    /// Position in the input batch. Used only to restore output order.
    index: usize,
    /// Platform ids that already attempted (and failed) this item.
    attempted: Vec<String>,
    /// Error from the most recent failed attempt.
    last_error: Option<CapabilityError>,
}

impl<T> WorkItem<T> {
    /// Create a fresh item with an empty retry ledger.
    pub fn new(index: usize, payload: T) -> Self {
        Self {
            payload,
            index,
            attempted: Vec::new(),
            last_error: None,
        }
    }

    /// Position of this item in the input batch.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The input payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Whether the given platform has already attempted this item.
    pub fn was_attempted(&self, platform_id: &str) -> bool {
        self.attempted.iter().any(|id| id == platform_id)
    }

    /// Record a failed attempt by a platform.
    ///
    /// Ids are never recorded twice; the ledger only grows.
    pub fn record_failure(&mut self, platform_id: &str, error: CapabilityError) {
        if !self.was_attempted(platform_id) {
            self.attempted.push(platform_id.to_string());
        }
        self.last_error = Some(error);
    }

    /// Number of platforms that have attempted this item.
    pub fn attempts(&self) -> usize {
        self.attempted.len()
    }

    /// Platform ids that have attempted this item, in attempt order.
    pub fn attempted(&self) -> &[String] {
        &self.attempted
    }

    /// Decompose into `(index, payload, attempted, last_error)`.
    pub fn into_parts(self) -> (usize, T, Vec<String>, Option<CapabilityError>) {
        (self.index, self.payload, self.attempted, self.last_error)
    }
}

/// Terminal outcome of one work item.
///
/// Exactly one outcome is recorded per input item; the set of outcome indices
/// of a finished batch is exactly the input index range.
#[derive(Debug)]
pub enum Outcome<T, R> {
    /// The item was extracted successfully by one platform.
    Success {
        /// Position in the input batch.
        index: usize,
        /// Platform that produced the result.
        platform_id: String,
        /// The original payload.
        payload: T,
        /// The extraction result.
        result: R,
        /// Wall time of the successful invocation.
        duration: Duration,
    },
    /// Every configured platform attempted the item and failed.
    Exhausted {
        /// Position in the input batch.
        index: usize,
        /// The original payload.
        payload: T,
        /// All platforms that attempted the item.
        attempted: Vec<String>,
        /// The error from the final attempt.
        last_error: CapabilityError,
    },
    /// The batch deadline fired before the item reached a terminal state.
    Expired {
        /// Position in the input batch.
        index: usize,
        /// The original payload.
        payload: T,
        /// Platforms that attempted the item before the deadline.
        attempted: Vec<String>,
    },
}

impl<T, R> Outcome<T, R> {
    /// Position of the underlying item in the input batch.
    pub fn index(&self) -> usize {
        match self {
            Outcome::Success { index, .. }
            | Outcome::Exhausted { index, .. }
            | Outcome::Expired { index, .. } => *index,
        }
    }

    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The extraction result, if this outcome is a success.
    pub fn result(&self) -> Option<&R> {
        match self {
            Outcome::Success { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_ledger_grows_monotonically() {
        let mut item = WorkItem::new(3, "payload");
        assert_eq!(item.index(), 3);
        assert_eq!(item.attempts(), 0);
        assert!(!item.was_attempted("a"));

        item.record_failure("a", CapabilityError::Transient("boom".to_string()));
        assert!(item.was_attempted("a"));
        assert_eq!(item.attempts(), 1);

        // Recording the same platform twice must not duplicate the entry.
        item.record_failure("a", CapabilityError::Transient("boom again".to_string()));
        assert_eq!(item.attempts(), 1);

        item.record_failure("b", CapabilityError::Permanent("bad".to_string()));
        assert_eq!(item.attempted(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_work_item_into_parts_keeps_last_error() {
        let mut item = WorkItem::new(0, 7u32);
        item.record_failure("a", CapabilityError::Transient("first".to_string()));
        item.record_failure("b", CapabilityError::Permanent("second".to_string()));

        let (index, payload, attempted, last_error) = item.into_parts();
        assert_eq!(index, 0);
        assert_eq!(payload, 7);
        assert_eq!(attempted.len(), 2);
        assert!(matches!(last_error, Some(CapabilityError::Permanent(_))));
    }

    #[test]
    fn test_outcome_accessors() {
        let success: Outcome<&str, u32> = Outcome::Success {
            index: 1,
            platform_id: "a".to_string(),
            payload: "p",
            result: 99,
            duration: Duration::from_millis(5),
        };
        assert_eq!(success.index(), 1);
        assert!(success.is_success());
        assert_eq!(success.result(), Some(&99));

        let exhausted: Outcome<&str, u32> = Outcome::Exhausted {
            index: 2,
            payload: "p",
            attempted: vec!["a".to_string()],
            last_error: CapabilityError::Transient("x".to_string()),
        };
        assert!(!exhausted.is_success());
        assert_eq!(exhausted.result(), None);
    }
}
