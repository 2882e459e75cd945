//! Cadence demo runner
//!
//! Owns the tick loop: builds a routine for the chosen scenario and ticks it
//! at a fixed interval until no block is active.

mod scenarios;

use anyhow::{Context, Result};
use cadence_config::{load_config, CadenceConfig};
use cadence_script::{Routine, SystemClock};
use clap::Parser;
use scenarios::Scenario;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Run a frame-driven action sequencer scenario",
    version
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, short = 'c', env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Delay between ticks in milliseconds (overrides the configuration)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many ticks (overrides the configuration)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CadenceConfig::default(),
    };
    if let Some(interval_ms) = cli.interval_ms {
        anyhow::ensure!(interval_ms > 0, "--interval-ms must be greater than zero");
        config.runner.tick_interval_ms = interval_ms;
    }
    if let Some(max_ticks) = cli.max_ticks {
        config.runner.max_ticks = Some(max_ticks);
    }

    // RUST_LOG wins over the configured filter
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.filter)
            .with_context(|| format!("invalid log filter '{}'", config.logging.filter))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(cli.scenario, &config)
}

fn run(scenario: Scenario, config: &CadenceConfig) -> Result<()> {
    let options = scenario.options(config.routine);
    let mut routine = Routine::with_options(SystemClock::new(), options);
    routine.properties_mut().extend(config.properties.clone());
    scenario
        .define(&mut routine)
        .with_context(|| format!("defining scenario {scenario:?}"))?;

    info!(?scenario, blocks = routine.len(), "Starting routine");

    let interval = config.runner.tick_interval();
    while routine.is_running() {
        if config.runner.max_ticks.is_some_and(|max| routine.ticks() >= max) {
            info!(ticks = routine.ticks(), "Tick limit reached");
            break;
        }

        let summary = routine.tick();
        if !summary.deactivated.is_empty() {
            debug!(tick = summary.tick, deactivated = ?summary.deactivated, "Blocks deactivated");
        }
        thread::sleep(interval);
    }

    info!(ticks = routine.ticks(), "Routine finished");
    Ok(())
}
