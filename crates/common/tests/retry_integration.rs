//! Integration tests for the retry controller
//!
//! Exercises the controller the way service clients drive it: a unit of work
//! that classifies its own failure into a verdict, virtual time for delayed
//! retries, and independent concurrent runs sharing one controller.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier_common::resilience::{Lookup, RetryController, RetryError, RetryPolicy, RetryVerdict};
use courier_common::testing::MockClock;
use tokio_util::sync::CancellationToken;

/// Error type standing in for a remote service failure
#[derive(Debug, Clone, PartialEq, Eq)]
struct RemoteError {
    code: &'static str,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "remote error {}", self.code)
    }
}

fn classify(error: RemoteError) -> RetryVerdict<String, RemoteError> {
    match error.code {
        "Cooldown" => RetryVerdict::RetryAfter(Duration::from_secs(60)),
        "Conflict" => RetryVerdict::RetryNow,
        "Missing" => RetryVerdict::Absent,
        _ => RetryVerdict::Fatal(error),
    }
}

/// Validates the cooldown scenario end to end.
///
/// # Test Steps
/// 1. First attempt fails with a cooldown error
/// 2. Controller waits 60 s of virtual time exactly once
/// 3. Second attempt succeeds
#[tokio::test]
async fn cooldown_waits_once_then_succeeds() {
    let clock = MockClock::new();
    let controller = RetryController::with_clock(RetryPolicy::default(), clock.clone());
    let calls = Arc::new(AtomicU32::new(0));

    let result = controller
        .run(&CancellationToken::new(), "create", || {
            let calls = calls.clone();
            async move {
                let outcome = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(RemoteError { code: "Cooldown" })
                } else {
                    Ok("queue/path".to_string())
                };
                match outcome {
                    Ok(path) => RetryVerdict::Succeed(path),
                    Err(error) => classify(error),
                }
            }
        })
        .await;

    assert_eq!(result, Ok(Lookup::Found("queue/path".to_string())));
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(60)]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fatal_error_is_preserved_verbatim() {
    let controller = RetryController::with_clock(RetryPolicy::default(), MockClock::new());

    let result = controller
        .run(&CancellationToken::new(), "send", || async {
            classify(RemoteError { code: "AccessDenied" })
        })
        .await;

    assert_eq!(result, Err(RetryError::Fatal(RemoteError { code: "AccessDenied" })));
}

#[tokio::test]
async fn exhausted_budget_is_distinct_from_fatal() {
    let policy = RetryPolicy::new(3, Duration::from_secs(60)).expect("valid policy");
    let controller = RetryController::with_clock(policy, MockClock::new());

    let result = controller
        .run(&CancellationToken::new(), "create", || async {
            classify(RemoteError { code: "Conflict" })
        })
        .await;

    match result {
        Err(RetryError::AttemptsExhausted { attempts }) => assert_eq!(attempts, 3),
        other => panic!("expected exhausted budget, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_runs_do_not_share_attempt_state() {
    let controller =
        Arc::new(RetryController::with_clock(RetryPolicy::default(), MockClock::new()));

    let mut handles = Vec::new();
    for index in 0..8u32 {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            let calls = Arc::new(AtomicU32::new(0));
            let outcome = controller
                .run_with_outcome(&CancellationToken::new(), "send", || {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < index % 3 {
                            RetryVerdict::<u32, RemoteError>::RetryNow
                        } else {
                            RetryVerdict::Succeed(index)
                        }
                    }
                })
                .await;
            (index, outcome.attempts, outcome.result)
        }));
    }

    for handle in handles {
        let (index, attempts, result) = handle.await.expect("task should finish");
        assert_eq!(attempts, index % 3 + 1);
        assert_eq!(result, Ok(Lookup::Found(index)));
    }
}

#[tokio::test]
async fn absent_short_circuits() {
    let controller = RetryController::with_clock(RetryPolicy::default(), MockClock::new());

    let result = controller
        .run(&CancellationToken::new(), "delete", || async {
            classify(RemoteError { code: "Missing" })
        })
        .await;

    assert_eq!(result, Ok(Lookup::Absent));
}
