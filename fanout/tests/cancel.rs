use fanout::sync::CancelToken;
use fanout::task;
use fanout::time::sleep;
use std::time::{Duration, Instant};

#[fanout::test]
async fn cancel_wakes_every_waiter() {
    let token = CancelToken::new();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let token = token.clone();
            task::spawn(async move { token.cancelled().await })
        })
        .collect();

    sleep(Duration::from_millis(10)).await;
    token.cancel();

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(token.is_cancelled());
}

#[fanout::test]
async fn cancelled_is_ready_after_cancel() {
    let token = CancelToken::new();
    token.cancel();

    let start = Instant::now();
    token.cancelled().await;

    assert!(start.elapsed() < Duration::from_millis(10));
}

#[fanout::test]
async fn cancel_is_idempotent() {
    let token = CancelToken::new();

    token.cancel();
    token.cancel();

    assert!(token.is_cancelled());
    assert!(token.clone().is_cancelled());
}
