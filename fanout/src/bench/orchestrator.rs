use super::config::{Config, Variant};
use super::memory::allocated_bytes;
use super::report;
use super::result::{TaskOutcome, TaskResult};
use super::runner::run_task;
use crate::runtime::task::{self, JoinSet};
use crate::runtime::yield_now::yield_now;
use crate::sync::CancelToken;
use crate::sync::mpsc::{self, Receiver};
use crate::error::Result;
use crate::time::sleep_until;

use std::fmt;
use std::io::Write;
use std::future::poll_fn;
use std::pin::Pin;
use std::task::Poll;
use std::time::{Duration, Instant};

/// Spawning hands control back to the scheduler this often so early runners
/// reach their sleep while the rest are still being created.
const SPAWN_BATCH: usize = 1024;

/// Lifecycle of one benchmark run. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    Spawning,
    AwaitingCompletion,
    Reporting,
    Done,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Self::Idle => Self::Spawning,
            Self::Spawning => Self::AwaitingCompletion,
            Self::AwaitingCompletion => Self::Reporting,
            Self::Reporting | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Spawning => "spawning",
            Self::AwaitingCompletion => "awaiting-completion",
            Self::Reporting => "reporting",
            Self::Done => "done",
        })
    }
}

/// Aggregate figures of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub launched: usize,
    pub completed: usize,
    /// Runners whose interruption was observed before the drain stopped.
    pub interrupted: usize,
    /// Whether the overall wait expired before every runner reported.
    pub timed_out: bool,
    pub wall_time: Duration,
    pub heap_before: usize,
    pub heap_after: usize,
}

impl Summary {
    /// Signed change in live heap bytes over the run.
    pub fn heap_delta(&self) -> i128 {
        self.heap_after as i128 - self.heap_before as i128
    }
}

/// Output of [`Orchestrator::run`].
///
/// A fresh run is in [`Phase::Reporting`]: its summary has been logged but
/// nothing was written yet. [`report`](Self::report) writes the stdout part
/// and moves it to [`Phase::Done`].
#[derive(Debug)]
pub struct Run {
    variant: Variant,
    results: Vec<TaskResult>,
    summary: Summary,
    phase: Phase,
}

impl Run {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Writes the per-task lines (or the banner) to `out` and finishes the
    /// run. Writing again after [`Phase::Done`] repeats the report.
    pub fn report<W: Write>(&mut self, out: &mut W) -> Result<()> {
        report::write(self, out)?;

        if self.phase == Phase::Reporting {
            let next = self.phase.next();
            tracing::debug!(from = %self.phase, to = %next, "phase transition");
            self.phase = next;
        }

        Ok(())
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Completed runners, in arrival order.
    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn into_results(self) -> Vec<TaskResult> {
        self.results
    }
}

/// Spawns the runners of one benchmark and waits for them.
///
/// ```rust,ignore
/// let run = Orchestrator::new(Config::new(Variant::Bounded, 3)).run().await;
/// ```
pub struct Orchestrator {
    config: Config,
    phase: Phase,
    cancel: CancelToken,
}

/// What the drain loop saw.
#[derive(Default)]
struct Drained {
    results: Vec<TaskResult>,
    interrupted: usize,
    timed_out: bool,
}

impl Drained {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Completed(result) => self.results.push(result),
            TaskOutcome::Interrupted { .. } => self.interrupted += 1,
        }
    }
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            cancel: CancelToken::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Token shared with every runner. Cancelling it interrupts the runners
    /// still sleeping.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Spawns the runners, waits for them and logs the summary.
    ///
    /// The returned [`Run`] is left in [`Phase::Reporting`] until
    /// [`Run::report`] writes it out. Must be awaited inside a Fanout
    /// runtime.
    pub async fn run(mut self) -> Run {
        let wall = Instant::now();
        let heap_before = allocated_bytes();

        tracing::info!(
            tasks = self.config.tasks,
            variant = %self.config.variant,
            sleep = ?self.config.sleep,
            wait = ?self.config.wait,
            "starting benchmark"
        );

        self.advance();
        let drained = match self.config.wait {
            Some(wait) => self.run_bounded(wait).await,
            None => self.run_unbounded().await,
        };

        self.advance();
        let summary = Summary {
            launched: self.config.tasks,
            completed: drained.results.len(),
            interrupted: drained.interrupted,
            timed_out: drained.timed_out,
            wall_time: wall.elapsed(),
            heap_before,
            heap_after: allocated_bytes(),
        };
        report::log_summary(&summary);

        Run {
            variant: self.config.variant,
            results: drained.results,
            summary,
            phase: self.phase,
        }
    }

    fn advance(&mut self) {
        let next = self.phase.next();
        tracing::debug!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }

    async fn run_bounded(&mut self, wait: Duration) -> Drained {
        let (sender, receiver) = mpsc::unbounded();

        for task_id in 0..self.config.tasks {
            let sender = sender.clone();
            let runner = run_task(
                task_id,
                self.config.sleep,
                self.config.sample_memory,
                self.cancel.clone(),
            );

            // Detached: the outcome travels over the channel.
            drop(task::spawn(async move {
                let _ = sender.send(runner.await);
            }));

            if (task_id + 1) % SPAWN_BATCH == 0 {
                yield_now().await;
            }
        }

        // No more work: the channel closes once the last runner reports.
        drop(sender);

        self.advance();

        let drained = drain_until(receiver, Instant::now() + wait).await;

        if drained.timed_out {
            tracing::warn!(
                ?wait,
                received = drained.results.len() + drained.interrupted,
                launched = self.config.tasks,
                "overall wait expired, cancelling remaining runners"
            );
            self.cancel.cancel();
        }

        drained
    }

    async fn run_unbounded(&mut self) -> Drained {
        let mut set = JoinSet::new();

        for task_id in 0..self.config.tasks {
            set.spawn(run_task(
                task_id,
                self.config.sleep,
                self.config.sample_memory,
                self.cancel.clone(),
            ));

            if (task_id + 1) % SPAWN_BATCH == 0 {
                yield_now().await;
            }
        }

        self.advance();

        let mut drained = Drained::default();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => drained.record(outcome),
                Err(err) => tracing::warn!(%err, "runner did not finish"),
            }
        }

        drained
    }
}

/// Collects outcomes until every sender is gone or `deadline` passes.
async fn drain_until(mut receiver: Receiver<TaskOutcome>, deadline: Instant) -> Drained {
    let mut drained = Drained::default();
    let mut timer = sleep_until(deadline);

    poll_fn(|cx| {
        loop {
            match receiver.poll_recv(cx) {
                Poll::Ready(Some(outcome)) => drained.record(outcome),
                Poll::Ready(None) => return Poll::Ready(()),
                Poll::Pending => break,
            }
        }

        match Pin::new(&mut timer).poll(cx) {
            Poll::Ready(()) => {
                drained.timed_out = true;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    })
    .await;

    drained
}
