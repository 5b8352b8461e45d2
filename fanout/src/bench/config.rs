use std::fmt;
use std::time::Duration;

/// Number of runners launched when no count is given.
pub const DEFAULT_TASKS: usize = 100_000;

/// How long each runner sleeps.
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(10);

/// Overall wait of the bounded variants, measured from the end of spawning.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(15);

/// Flavour of the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// Bounded wait, one line per completed runner.
    #[default]
    Bounded,
    /// Like `bounded`, with heap samples around each sleep.
    Sampled,
    /// Joins every runner without a deadline and prints a single banner.
    Unbounded,
}

impl Variant {
    /// Whether the report lists every completed runner.
    pub fn reports_each_task(self) -> bool {
        !matches!(self, Self::Unbounded)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bounded => "bounded",
            Self::Sampled => "sampled",
            Self::Unbounded => "unbounded",
        })
    }
}

/// Benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of runners to launch.
    pub tasks: usize,
    /// Per-runner sleep.
    pub sleep: Duration,
    /// Overall wait; `None` joins every runner however long it takes.
    pub wait: Option<Duration>,
    /// Sample heap usage before and after each sleep.
    pub sample_memory: bool,
    pub variant: Variant,
}

impl Config {
    /// Defaults of `variant` for `tasks` runners.
    pub fn new(variant: Variant, tasks: usize) -> Self {
        let (wait, sample_memory) = match variant {
            Variant::Bounded => (Some(DEFAULT_WAIT), false),
            Variant::Sampled => (Some(DEFAULT_WAIT), true),
            Variant::Unbounded => (None, false),
        };

        Self {
            tasks,
            sleep: DEFAULT_SLEEP,
            wait,
            sample_memory,
            variant,
        }
    }

    pub fn sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    /// Overrides the overall wait. Ignored by [`Variant::Unbounded`].
    pub fn wait(mut self, wait: Duration) -> Self {
        if self.variant != Variant::Unbounded {
            self.wait = Some(wait);
        }
        self
    }

    pub fn sample_memory(mut self, enabled: bool) -> Self {
        self.sample_memory = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Variant::default(), DEFAULT_TASKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_defaults() {
        let bounded = Config::new(Variant::Bounded, 3);
        assert_eq!(bounded.wait, Some(DEFAULT_WAIT));
        assert!(!bounded.sample_memory);
        assert_eq!(bounded.sleep, DEFAULT_SLEEP);

        let sampled = Config::new(Variant::Sampled, 3);
        assert_eq!(sampled.wait, Some(DEFAULT_WAIT));
        assert!(sampled.sample_memory);

        let unbounded = Config::new(Variant::Unbounded, 3);
        assert_eq!(unbounded.wait, None);
        assert!(!unbounded.variant.reports_each_task());
    }

    #[test]
    fn unbounded_ignores_wait_override() {
        let config = Config::new(Variant::Unbounded, 1).wait(Duration::from_millis(5));
        assert_eq!(config.wait, None);

        let config = Config::new(Variant::Bounded, 1).wait(Duration::from_millis(5));
        assert_eq!(config.wait, Some(Duration::from_millis(5)));
    }

    #[test]
    fn default_is_bounded_with_full_task_count() {
        let config = Config::default();
        assert_eq!(config.tasks, DEFAULT_TASKS);
        assert_eq!(config.variant, Variant::Bounded);
    }
}
