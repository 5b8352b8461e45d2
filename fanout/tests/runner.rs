use fanout::bench::{TaskOutcome, run_task};
use fanout::sync::CancelToken;
use fanout::task;
use fanout::time::sleep;
use std::time::Duration;

#[fanout::test]
async fn runner_completes_after_its_sleep() {
    let outcome = run_task(3, Duration::from_millis(20), false, CancelToken::new()).await;

    let TaskOutcome::Completed(result) = outcome else {
        panic!("runner should complete, got {outcome:?}");
    };

    assert_eq!(result.task_id(), 3);
    assert!(result.duration() >= Duration::from_millis(20));
    assert_eq!(result.memory_before(), None);
    assert_eq!(result.memory_after(), None);
}

#[fanout::test]
async fn runner_samples_memory_when_asked() {
    let outcome = run_task(0, Duration::from_millis(5), true, CancelToken::new()).await;
    let result = outcome.into_result().unwrap();

    // The test binary does not install the tracking allocator, but the
    // samples are still taken.
    assert!(result.memory_before().is_some());
    assert!(result.memory_after().is_some());
}

#[fanout::test]
async fn cancelled_runner_is_interrupted_without_a_result() {
    let token = CancelToken::new();
    let runner = task::spawn(run_task(9, Duration::from_secs(5), false, token.clone()));

    sleep(Duration::from_millis(10)).await;
    token.cancel();

    let outcome = runner.await.unwrap();

    assert!(matches!(outcome, TaskOutcome::Interrupted { task_id: 9, .. }));
    assert!(outcome.into_result().is_none());
    assert!(token.is_cancelled(), "Token stays cancelled for outer code");
}

#[fanout::test]
async fn runner_with_cancelled_token_returns_immediately() {
    let token = CancelToken::new();
    token.cancel();

    let outcome = run_task(1, Duration::from_secs(5), false, token).await;

    let TaskOutcome::Interrupted { elapsed, .. } = outcome else {
        panic!("runner should be interrupted");
    };
    assert!(elapsed < Duration::from_secs(1));
}
