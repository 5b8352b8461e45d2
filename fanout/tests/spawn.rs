use fanout::task::{self, JoinError};
use fanout::time::sleep;
use fanout::yield_now;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

async fn explode() -> u32 {
    panic!("task failed")
}

#[fanout::test]
async fn join_handle_returns_output() {
    let handle = task::spawn(async { 40 + 2 });

    assert_eq!(handle.await.unwrap(), 42);
}

#[fanout::test]
async fn abort_cancels_a_sleeping_task() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = ran.clone();

    let handle = task::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        ran_clone.store(true, Ordering::SeqCst);
    });

    sleep(Duration::from_millis(10)).await;
    handle.abort();

    assert!(matches!(handle.await, Err(JoinError::Cancelled)));

    sleep(Duration::from_millis(150)).await;
    assert!(!ran.load(Ordering::SeqCst));
}

#[fanout::test]
async fn abort_after_completion_keeps_output() {
    let handle = task::spawn(async { "done" });

    while !handle.is_finished() {
        yield_now().await;
    }
    handle.abort();

    assert_eq!(handle.await.unwrap(), "done");
}

#[fanout::test]
async fn panicking_task_does_not_take_down_the_worker() {
    let handle = task::spawn(explode());

    let err = handle.await.unwrap_err();
    assert!(err.is_panic());
    assert!(!err.is_cancelled());

    let after = task::spawn(async { 7 });
    assert_eq!(after.await.unwrap(), 7);
}

#[fanout::test(worker_threads = 1)]
async fn yield_now_lets_other_tasks_run() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let handle = task::spawn(async move {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });

    while counter.load(Ordering::SeqCst) == 0 {
        yield_now().await;
    }

    handle.await.unwrap();
}
