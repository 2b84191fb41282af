//! Integration tests for the dispatch core.
//!
//! Exercises the full coordinator/pool/worker/aggregator loop with scripted
//! capabilities: completeness of outcomes, the at-most-once-per-platform
//! rule, exhaustion, output ordering, single-platform degeneracy, drain
//! behavior under in-flight re-enqueues, and both timeout layers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kwforge::dispatch::{
    Capability, CapabilityError, Coordinator, DispatchConfig, DispatchError, Outcome, Platform,
};

/// What one scripted platform does with incoming items.
enum Behavior {
    /// Succeed on every item.
    Succeed,
    /// Fail on every item with a transient error.
    Fail,
    /// Fail only the listed items.
    FailItems(HashSet<usize>),
    /// Fail the first invocation across the whole batch, then succeed.
    FailFirst(Arc<AtomicBool>),
    /// Sleep far past any call timeout.
    Hang,
}

/// Scripted capability that logs every attempt it receives.
struct Scripted {
    platform_id: String,
    behavior: Behavior,
    log: Arc<Mutex<Vec<(String, usize)>>>,
}

#[async_trait]
impl Capability<usize, String> for Scripted {
    async fn invoke(&self, payload: &usize) -> Result<String, CapabilityError> {
        self.log
            .lock()
            .expect("attempt log mutex poisoned")
            .push((self.platform_id.clone(), *payload));

        match &self.behavior {
            Behavior::Succeed => Ok(format!("{}:{}", self.platform_id, payload)),
            Behavior::Fail => Err(CapabilityError::Transient("scripted failure".to_string())),
            Behavior::FailItems(items) => {
                if items.contains(payload) {
                    Err(CapabilityError::Transient("scripted failure".to_string()))
                } else {
                    Ok(format!("{}:{}", self.platform_id, payload))
                }
            }
            Behavior::FailFirst(failed_once) => {
                if failed_once
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    Err(CapabilityError::Transient("first call fails".to_string()))
                } else {
                    Ok(format!("{}:{}", self.platform_id, payload))
                }
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("unreachable".to_string())
            }
        }
    }
}

struct Harness {
    platforms: Vec<Platform<usize, String>>,
    log: Arc<Mutex<Vec<(String, usize)>>>,
}

impl Harness {
    fn new(specs: Vec<(&str, Behavior)>) -> Self {
        let log: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let platforms = specs
            .into_iter()
            .map(|(id, behavior)| {
                let capability = Scripted {
                    platform_id: id.to_string(),
                    behavior,
                    log: Arc::clone(&log),
                };
                Platform::new(
                    id,
                    Arc::new(capability) as Arc<dyn Capability<usize, String>>,
                )
            })
            .collect();
        Self { platforms, log }
    }

    fn attempts(&self) -> Vec<(String, usize)> {
        self.log.lock().expect("attempt log mutex poisoned").clone()
    }
}

fn assert_indices_complete(outcomes: &[Outcome<usize, String>], total: usize) {
    let indices: Vec<usize> = outcomes.iter().map(|o| o.index()).collect();
    assert_eq!(
        indices,
        (0..total).collect::<Vec<_>>(),
        "every input index must appear exactly once, in order"
    );
}

#[tokio::test]
async fn test_all_success_batch_is_complete_and_ordered() {
    let harness = Harness::new(vec![("a", Behavior::Succeed), ("b", Behavior::Succeed)]);
    let report = Coordinator::new(harness.platforms.clone())
        .run((0..20).collect())
        .await
        .expect("batch should run");

    assert_indices_complete(&report.outcomes, 20);
    assert!(report.outcomes.iter().all(|o| o.is_success()));
    assert_eq!(report.stats.successes, 20);
    assert_eq!(report.stats.exhausted, 0);
    assert_eq!(report.stats.expired, 0);
}

#[tokio::test]
async fn test_no_platform_attempts_an_item_twice() {
    // Half the items fail everywhere, forcing maximum retry churn.
    let failing: HashSet<usize> = (0..10).filter(|i| i % 2 == 0).collect();
    let harness = Harness::new(vec![
        ("a", Behavior::FailItems(failing.clone())),
        ("b", Behavior::FailItems(failing.clone())),
        ("c", Behavior::FailItems(failing)),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run((0..10).collect())
        .await
        .expect("batch should run");
    assert_indices_complete(&report.outcomes, 10);

    let mut seen: HashSet<(String, usize)> = HashSet::new();
    for attempt in harness.attempts() {
        assert!(
            seen.insert(attempt.clone()),
            "platform {} attempted item {} twice",
            attempt.0,
            attempt.1
        );
    }
}

#[tokio::test]
async fn test_exhausted_items_carry_full_ledger_and_last_error() {
    let harness = Harness::new(vec![("a", Behavior::Fail), ("b", Behavior::Fail)]);
    let report = Coordinator::new(harness.platforms.clone())
        .run(vec![0, 1, 2])
        .await
        .expect("batch should run");

    assert_indices_complete(&report.outcomes, 3);
    assert_eq!(report.stats.exhausted, 3);

    for outcome in &report.outcomes {
        match outcome {
            Outcome::Exhausted {
                attempted,
                last_error,
                ..
            } => {
                let ids: HashSet<&str> = attempted.iter().map(String::as_str).collect();
                assert_eq!(ids, HashSet::from(["a", "b"]));
                assert!(matches!(last_error, CapabilityError::Transient(_)));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    // Two platforms, three items, everything fails: exactly 6 attempts.
    assert_eq!(harness.attempts().len(), 6);
}

#[tokio::test]
async fn test_single_platform_failure_is_immediately_terminal() {
    let harness = Harness::new(vec![("only", Behavior::FailItems(HashSet::from([1])))]);
    let report = Coordinator::new(harness.platforms.clone())
        .run(vec![0, 1, 2])
        .await
        .expect("batch should run");

    assert_indices_complete(&report.outcomes, 3);
    assert_eq!(report.stats.successes, 2);
    assert_eq!(report.stats.exhausted, 1);

    match &report.outcomes[1] {
        Outcome::Exhausted { attempted, .. } => {
            assert_eq!(attempted, &["only".to_string()]);
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_drain_waits_for_inflight_reenqueue() {
    // One item, and the first attempt anywhere fails. The second worker sees
    // an empty pool while the item is in flight; it must park and pick the
    // re-enqueued item up instead of exiting.
    let failed_once = Arc::new(AtomicBool::new(false));
    let harness = Harness::new(vec![
        ("a", Behavior::FailFirst(Arc::clone(&failed_once))),
        ("b", Behavior::FailFirst(failed_once)),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run(vec![0])
        .await
        .expect("batch should run");

    assert_eq!(report.stats.successes, 1);
    match &report.outcomes[0] {
        Outcome::Success { platform_id, .. } => {
            // Whichever platform failed first, the other one finished it.
            assert_eq!(harness.attempts().len(), 2);
            let first = &harness.attempts()[0].0;
            assert_ne!(platform_id, first);
        }
        other => panic!("expected Success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_five_items_four_platforms_one_always_failing() {
    let harness = Harness::new(vec![
        ("a", Behavior::Fail),
        ("b", Behavior::Succeed),
        ("c", Behavior::Succeed),
        ("d", Behavior::Succeed),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run((0..5).collect())
        .await
        .expect("batch should run");

    assert_indices_complete(&report.outcomes, 5);
    assert_eq!(report.stats.successes, 5);

    let stats_a = &report.stats.platforms["a"];
    assert_eq!(stats_a.successes, 0);
    // Platform a only ever produced failures (possibly zero if it never won
    // the race for an item).
    let healthy_successes: u64 = ["b", "c", "d"]
        .iter()
        .filter_map(|id| report.stats.platforms.get(*id))
        .map(|s| s.successes)
        .sum();
    assert_eq!(healthy_successes, 5);
}

#[tokio::test]
async fn test_one_item_three_platforms() {
    let harness = Harness::new(vec![
        ("a", Behavior::Succeed),
        ("b", Behavior::Succeed),
        ("c", Behavior::Succeed),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run(vec![7])
        .await
        .expect("batch should run");

    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].is_success());
    // Exactly one platform attempted the single item.
    assert_eq!(harness.attempts().len(), 1);
}

#[tokio::test]
async fn test_one_item_lands_on_the_only_healthy_platform() {
    let harness = Harness::new(vec![
        ("a", Behavior::Fail),
        ("b", Behavior::Fail),
        ("c", Behavior::Succeed),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run(vec![0])
        .await
        .expect("batch should run");

    match &report.outcomes[0] {
        Outcome::Success { platform_id, .. } => assert_eq!(platform_id, "c"),
        other => panic!("expected Success, got {:?}", other),
    }

    // However the item bounced between the failing platforms, none of the
    // three attempted it more than once.
    let attempts = harness.attempts();
    let unique: HashSet<&(String, usize)> = attempts.iter().collect();
    assert_eq!(unique.len(), attempts.len());
    assert!(attempts.len() <= 3);
}

#[tokio::test]
async fn test_per_call_timeout_counts_as_failure() {
    let harness = Harness::new(vec![("slow", Behavior::Hang)]);
    let config = DispatchConfig::default().with_call_timeout(Duration::from_millis(50));

    let report = Coordinator::with_config(harness.platforms.clone(), config)
        .run(vec![0])
        .await
        .expect("batch should run");

    assert_eq!(report.stats.exhausted, 1);
    match &report.outcomes[0] {
        Outcome::Exhausted { last_error, .. } => {
            assert!(matches!(last_error, CapabilityError::Timeout(_)));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
    assert_eq!(report.stats.platforms["slow"].failures, 1);
}

#[tokio::test]
async fn test_batch_timeout_expires_unfinished_items() {
    let harness = Harness::new(vec![("a", Behavior::Hang), ("b", Behavior::Hang)]);
    let config = DispatchConfig::default()
        .with_call_timeout(Duration::from_millis(300))
        .with_batch_timeout(Duration::from_millis(50));

    let report = Coordinator::with_config(harness.platforms.clone(), config)
        .run(vec![0, 1])
        .await
        .expect("batch should run");

    assert_indices_complete(&report.outcomes, 2);
    assert_eq!(report.stats.expired, 2);
    assert_eq!(report.stats.successes, 0);

    for outcome in &report.outcomes {
        match outcome {
            Outcome::Expired { attempted, .. } => {
                // The in-flight attempt settled (as a timeout failure) before
                // the item was reported expired.
                assert_eq!(attempted.len(), 1);
            }
            other => panic!("expected Expired, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_zero_platforms_is_config_error() {
    let coordinator: Coordinator<usize, String> = Coordinator::new(Vec::new());
    assert!(matches!(
        coordinator.run(vec![0]).await,
        Err(DispatchError::NoPlatforms)
    ));
}

#[tokio::test]
async fn test_empty_batch_completes_immediately() {
    let harness = Harness::new(vec![("a", Behavior::Succeed)]);
    let report = Coordinator::new(harness.platforms.clone())
        .run(Vec::new())
        .await
        .expect("empty batch should run");

    assert!(report.outcomes.is_empty());
    assert_eq!(report.stats.total_items, 0);
    assert!(harness.attempts().is_empty());
}

#[tokio::test]
async fn test_concurrent_batches_do_not_interfere() {
    // Coordinators are plain values with no shared process state.
    let first = Harness::new(vec![("a", Behavior::Succeed)]);
    let second = Harness::new(vec![("a", Behavior::Fail)]);

    let coordinator_one = Coordinator::new(first.platforms.clone());
    let coordinator_two = Coordinator::new(second.platforms.clone());

    let (one, two) = tokio::join!(
        coordinator_one.run((0..5).collect()),
        coordinator_two.run((0..5).collect())
    );

    let one = one.expect("first batch should run");
    let two = two.expect("second batch should run");
    assert_eq!(one.stats.successes, 5);
    assert_eq!(two.stats.exhausted, 5);

    let platform_stats = &two.stats.platforms["a"];
    assert_eq!(platform_stats.failures, 5);
}

#[tokio::test]
async fn test_attempt_counts_match_outcome_histories() {
    let failing: HashSet<usize> = HashSet::from([0, 3]);
    let harness = Harness::new(vec![
        ("a", Behavior::FailItems(failing.clone())),
        ("b", Behavior::FailItems(failing)),
    ]);

    let report = Coordinator::new(harness.platforms.clone())
        .run((0..5).collect())
        .await
        .expect("batch should run");

    // Reconstruct per-item attempt counts from the shared log and compare
    // with what the outcomes report.
    let mut per_item: HashMap<usize, usize> = HashMap::new();
    for (_, item) in harness.attempts() {
        *per_item.entry(item).or_insert(0) += 1;
    }

    for outcome in &report.outcomes {
        match outcome {
            Outcome::Success { index, .. } => {
                // Failures before the success, plus the success itself.
                assert!(per_item[index] >= 1 && per_item[index] <= 2);
            }
            Outcome::Exhausted {
                index, attempted, ..
            } => {
                assert_eq!(per_item[index], attempted.len());
                assert_eq!(attempted.len(), 2);
            }
            Outcome::Expired { .. } => panic!("no deadline configured"),
        }
    }
}
