use std::time::{Duration, Instant};

/// Timing record of one runner that slept to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    task_id: usize,
    started: Instant,
    finished: Instant,
    memory_before: Option<usize>,
    memory_after: Option<usize>,
}

impl TaskResult {
    pub(crate) fn new(
        task_id: usize,
        started: Instant,
        finished: Instant,
        memory_before: Option<usize>,
        memory_after: Option<usize>,
    ) -> Self {
        Self {
            task_id,
            started,
            finished,
            memory_before,
            memory_after,
        }
    }

    pub fn task_id(&self) -> usize {
        self.task_id
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn finished(&self) -> Instant {
        self.finished
    }

    /// `finished - started`, clamped at zero.
    pub fn duration(&self) -> Duration {
        self.finished.saturating_duration_since(self.started)
    }

    /// Live heap bytes sampled right before the sleep, if sampling was on.
    pub fn memory_before(&self) -> Option<usize> {
        self.memory_before
    }

    pub fn memory_after(&self) -> Option<usize> {
        self.memory_after
    }
}

/// What a runner hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(TaskResult),
    /// The runner was cancelled mid-sleep. Never recorded as a result.
    Interrupted { task_id: usize, elapsed: Duration },
}

impl TaskOutcome {
    pub fn task_id(&self) -> usize {
        match self {
            Self::Completed(result) => result.task_id(),
            Self::Interrupted { task_id, .. } => *task_id,
        }
    }

    pub fn into_result(self) -> Option<TaskResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Interrupted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_never_goes_negative() {
        let later = Instant::now();
        let earlier = later - Duration::from_millis(5);

        let forward = TaskResult::new(0, earlier, later, None, None);
        assert_eq!(forward.started(), earlier);
        assert_eq!(forward.finished(), later);
        assert_eq!(forward.duration(), Duration::from_millis(5));

        let backward = TaskResult::new(1, later, earlier, None, None);
        assert_eq!(backward.duration(), Duration::ZERO);
    }

    #[test]
    fn interrupted_outcome_has_no_result() {
        let outcome = TaskOutcome::Interrupted {
            task_id: 4,
            elapsed: Duration::from_millis(1),
        };

        assert_eq!(outcome.task_id(), 4);
        assert_eq!(outcome.into_result(), None);
    }
}
