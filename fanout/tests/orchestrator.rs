use fanout::RuntimeBuilder;
use fanout::bench::{Config, Orchestrator, Phase, Variant, report};
use std::collections::HashSet;
use std::time::{Duration, Instant};

fn config(variant: Variant, tasks: usize, sleep_ms: u64) -> Config {
    Config::new(variant, tasks).sleep(Duration::from_millis(sleep_ms))
}

#[fanout::test]
async fn zero_tasks_finish_cleanly() {
    let run = Orchestrator::new(config(Variant::Bounded, 0, 10)).run().await;

    assert!(run.results().is_empty());
    assert_eq!(run.summary().launched, 0);
    assert_eq!(run.summary().completed, 0);
    assert!(!run.summary().timed_out);
}

#[fanout::test]
async fn three_tasks_report_every_id() {
    let run = Orchestrator::new(config(Variant::Bounded, 3, 20)).run().await;

    let ids: HashSet<usize> = run.results().iter().map(|r| r.task_id()).collect();
    assert_eq!(ids, HashSet::from([0, 1, 2]));

    for result in run.results() {
        assert!(result.duration() >= Duration::from_millis(20));
        assert!(result.duration() < Duration::from_secs(2));
    }

    assert_eq!(run.summary().completed, 3);
    assert!(!run.summary().timed_out);
}

#[fanout::test(worker_threads = 4)]
async fn many_tasks_all_complete_within_the_wait() {
    let run = Orchestrator::new(config(Variant::Bounded, 20_000, 50)).run().await;

    assert_eq!(run.results().len(), 20_000);
    assert_eq!(run.summary().interrupted, 0);
}

#[fanout::test]
async fn short_wait_times_out_without_deadlock() {
    let start = Instant::now();
    let config = config(Variant::Bounded, 5_000, 5_000).wait(Duration::from_millis(50));

    let run = Orchestrator::new(config).run().await;

    assert!(run.summary().timed_out);
    assert!(run.results().len() <= 5_000);
    assert!(run.results().is_empty(), "No runner can finish a 5s sleep in 50ms");
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[fanout::test]
async fn sampled_variant_records_heap_samples() {
    let run = Orchestrator::new(config(Variant::Sampled, 4, 5)).run().await;

    assert_eq!(run.results().len(), 4);
    for result in run.results() {
        assert!(result.memory_before().is_some());
        assert!(result.memory_after().is_some());
    }
}

#[fanout::test]
async fn unbounded_variant_joins_everything() {
    let mut run = Orchestrator::new(config(Variant::Unbounded, 10, 10)).run().await;

    assert_eq!(run.variant(), Variant::Unbounded);
    assert_eq!(run.results().len(), 10);
    assert!(!run.summary().timed_out);

    let mut out = Vec::new();
    run.report(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "All fibers complete\n");
    assert_eq!(run.phase(), Phase::Done);
}

#[fanout::test]
async fn rerun_yields_the_same_count() {
    let first = Orchestrator::new(config(Variant::Bounded, 50, 5)).run().await;
    let second = Orchestrator::new(config(Variant::Bounded, 50, 5)).run().await;

    assert_eq!(first.results().len(), second.results().len());
    assert_eq!(first.results().len(), 50);
}

#[fanout::test]
async fn cancelling_the_token_interrupts_runners() {
    let orchestrator = Orchestrator::new(config(Variant::Bounded, 100, 5_000));
    let token = orchestrator.cancel_token();
    assert_eq!(orchestrator.phase(), Phase::Idle);

    fanout::task::spawn(async move {
        fanout::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
    });

    let run = orchestrator.run().await;

    assert!(run.results().is_empty());
    assert_eq!(run.summary().interrupted, 100);
    assert!(!run.summary().timed_out);
}

#[test]
fn per_task_report_lines_follow_arrival_order() {
    let runtime = RuntimeBuilder::new().worker_threads(2).build().unwrap();
    let mut run = runtime.block_on(Orchestrator::new(config(Variant::Bounded, 3, 10)).run());

    assert_eq!(run.phase(), Phase::Reporting);

    let mut out = Vec::new();
    run.report(&mut out).unwrap();
    assert_eq!(run.phase(), Phase::Done);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    for (line, result) in lines.iter().zip(run.results()) {
        assert_eq!(*line, report::task_line(result));
        assert!(line.starts_with(&format!("Task {} completed in 0.", result.task_id())));
        assert!(line.ends_with(" seconds"));
    }
}

#[fanout::test]
async fn results_keep_their_timestamps() {
    let before = Instant::now();
    let run = Orchestrator::new(config(Variant::Bounded, 5, 10)).run().await;
    let after = Instant::now();

    let results = run.into_results();
    assert_eq!(results.len(), 5);

    for result in &results {
        assert!(result.started() >= before);
        assert!(result.finished() <= after);
        assert_eq!(result.duration(), result.finished() - result.started());
    }
}
