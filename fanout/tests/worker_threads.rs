use fanout::RuntimeBuilder;
use fanout::sync::{CancelToken, mpsc};
use fanout::task::spawn;
use fanout::time::sleep;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Sets its flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_single_worker_thread() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let result = rt.block_on(async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn test_worker_threads_parallel_execution() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let results = Arc::new(Mutex::new(Vec::new()));
    let results_clone = results.clone();

    let doubled: usize = rt.block_on(async move {
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let results = results_clone.clone();
                spawn(async move {
                    results.lock().unwrap().push(i);
                    i * 2
                })
            })
            .collect();

        let mut sum = 0;
        for handle in handles {
            sum += handle.await.unwrap();
        }
        sum
    });

    assert_eq!(doubled, 90);
    assert_eq!(results.lock().unwrap().len(), 10);
}

#[test]
fn test_worker_threads_stress() {
    let rt = RuntimeBuilder::new().worker_threads(8).build().unwrap();

    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    rt.block_on(async move {
        let handles: Vec<_> = (0..10_000)
            .map(|_| {
                let counter = counter_clone.clone();
                spawn(async move {
                    *counter.lock().unwrap() += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    });

    assert_eq!(*counter.lock().unwrap(), 10_000);
}

#[test]
fn test_worker_threads_chain_spawn() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let result = rt.block_on(async {
        let handle1 = spawn(async {
            let handle2 = spawn(async {
                let handle3 = spawn(async { 10 });
                handle3.await.unwrap() + 20
            });
            handle2.await.unwrap() + 30
        });
        handle1.await.unwrap() + 40
    });

    assert_eq!(result, 100);
}

#[test]
fn test_worker_threads_two_threads() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let completed = Arc::new(Mutex::new(HashSet::new()));
    let completed_clone = completed.clone();

    rt.block_on(async move {
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let completed = completed_clone.clone();
                spawn(async move {
                    completed.lock().unwrap().insert(i);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    });

    let set = completed.lock().unwrap();
    assert_eq!(set.len(), 20);
    for i in 0..20 {
        assert!(set.contains(&i), "Task {} should have completed", i);
    }
}

#[test]
fn test_workers_are_named() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let name = rt.block_on(async { thread::current().name().map(str::to_owned) });

    assert_eq!(name.as_deref(), Some("fanout-worker-0"));
}

#[test]
#[should_panic(expected = "worker_threads must be > 0")]
fn test_worker_threads_zero_panics() {
    let _ = RuntimeBuilder::new().worker_threads(0).build();
}

#[test]
fn test_worker_threads_sequential_runtimes() {
    for n in 1..=4 {
        let rt = RuntimeBuilder::new().worker_threads(n).build().unwrap();
        let result = rt.block_on(async move { n * 10 });
        assert_eq!(result, n * 10);
        drop(rt);
    }
}

async fn explode() -> u8 {
    panic!("boom")
}

#[test]
#[should_panic(expected = "boom")]
fn test_block_on_propagates_panic() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let _: u8 = rt.block_on(explode());
}

#[test]
fn test_runtime_spawn_from_outside() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let handle = rt.spawn(async { "spawned" });
    let result = rt.block_on(handle);

    assert_eq!(result.unwrap(), "spawned");
}

#[test]
fn test_drop_releases_task_waiting_on_cancel_token() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let dropped = Arc::new(AtomicBool::new(false));
    let token = CancelToken::new();

    let guard = DropFlag(dropped.clone());
    let waiter = token.clone();
    let _handle = rt.spawn(async move {
        let _guard = guard;
        waiter.cancelled().await;
    });

    // Let the task park on the token.
    rt.block_on(sleep(Duration::from_millis(20)));

    drop(token);
    drop(rt);

    assert!(dropped.load(Ordering::SeqCst), "Parked task should be dropped");
}

#[test]
fn test_drop_releases_task_waiting_on_channel() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let dropped = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::unbounded::<()>();

    let guard = DropFlag(dropped.clone());
    let handle = rt.spawn(async move {
        let _guard = guard;
        let _tx = tx;
        rx.recv().await;
    });

    rt.block_on(sleep(Duration::from_millis(20)));
    assert!(!handle.is_finished());

    drop(rt);

    assert!(dropped.load(Ordering::SeqCst), "Parked task should be dropped");
    assert!(handle.is_finished());
}
