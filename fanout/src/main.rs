use std::alloc::System;
use std::io;
use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fanout::RuntimeBuilder;
use fanout::bench::memory::TrackingAllocator;
use fanout::bench::{Config, DEFAULT_TASKS, Orchestrator, Variant};

#[global_allocator]
static ALLOC: TrackingAllocator<System> = TrackingAllocator::new(System);

/// Spawn a large number of sleeping tasks and report how long each took.
#[derive(Debug, Parser)]
#[command(name = "fanout", version, about)]
struct Cli {
    /// Number of tasks to launch.
    #[arg(default_value_t = DEFAULT_TASKS)]
    tasks: usize,

    /// Benchmark variant.
    #[arg(long, value_enum, default_value_t = Variant::Bounded)]
    variant: Variant,

    /// Per-task sleep in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    sleep_ms: u64,

    /// Overall wait in milliseconds for the bounded variants.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Sample heap usage around every sleep, whatever the variant.
    #[arg(long)]
    memory: bool,

    /// Worker threads (default: available parallelism).
    #[arg(long, value_name = "N")]
    workers: Option<NonZeroUsize>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config =
            Config::new(self.variant, self.tasks).sleep(Duration::from_millis(self.sleep_ms));

        if let Some(ms) = self.timeout_ms {
            config = config.wait(Duration::from_millis(ms));
        }

        if self.memory {
            config = config.sample_memory(true);
        }

        config
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut builder = RuntimeBuilder::new();
    if let Some(workers) = cli.workers {
        builder = builder.worker_threads(workers.get());
    }

    let runtime = builder.build().context("failed to start the runtime")?;
    let mut run = runtime.block_on(Orchestrator::new(cli.config()).run());
    drop(runtime);

    run.report(&mut io::stdout().lock())?;

    Ok(())
}
