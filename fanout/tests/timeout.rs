use fanout::task;
use fanout::time::{Elapsed, sleep, timeout};
use std::time::{Duration, Instant};

#[fanout::test]
async fn test_timeout_completes_before_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(200), handle).await;

    assert!(
        matches!(result, Ok(Ok(123))),
        "Timeout should return Ok(Ok(123))"
    );
}

#[fanout::test]
async fn test_timeout_expires() {
    let start = Instant::now();
    let handle = task::spawn(async {
        sleep(Duration::from_millis(500)).await;
        456
    });

    let result = timeout(Duration::from_millis(20), handle).await;

    assert!(matches!(result, Err(Elapsed { .. })));
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[fanout::test]
async fn test_timeout_ready_future_wins() {
    let result = timeout(Duration::ZERO, async { 7 }).await;

    assert_eq!(result, Ok(7));
}

#[fanout::test]
async fn test_elapsed_message() {
    let err = timeout(Duration::from_millis(1), sleep(Duration::from_secs(5)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "deadline has elapsed");
}
