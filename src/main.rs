use anyhow::{Context, anyhow};
use clap::Parser;
use embassy_executor::{Executor, Spawner};
use env_logger::Builder;
use log::{LevelFilter, error, info};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crate::common::config::{RunConfig, RunOverrides, resolve};
use crate::common::scenario::load_scenario;
use crate::simulation::{RunSettings, RunSummary, Scenario, simulation_task};
use crate::tick_log::{LogFormat, TickLogger};

mod common;
mod simulation;
mod tick_log;

/// Replays vehicle paths as V2X telemetry over UDP.
#[derive(Parser, Debug)]
#[command(name = "v2x-simulator", version, about)]
struct Cli {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Run configuration TOML (defaults to config.toml next to the scenario)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default transmission frequency in Hz
    #[arg(long)]
    frequency: Option<u32>,

    /// Number of times the scenario is replayed
    #[arg(long)]
    repeat: Option<u32>,

    /// Tick log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Tick log path (defaults to a timestamped file in the log directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug output for this crate
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,

    /// Load and validate the scenario, then exit
    #[arg(long)]
    check: bool,
}

fn embassy_init(
    spawner: Spawner,
    scenario: &'static Scenario,
    settings: RunSettings,
    logger: &'static TickLogger,
    done: mpsc::Sender<anyhow::Result<RunSummary>>,
) {
    let _ = spawner.spawn(simulation_task(scenario, settings, logger, done));
}

fn init_logging(cli: &Cli) {
    let mut builder = Builder::new();
    if cli.quiet {
        builder.filter_level(LevelFilter::Warn);
    } else {
        builder.filter_level(LevelFilter::Info);
        if cli.verbose {
            builder.filter(Some("v2x_simulator"), LevelFilter::Debug);
        }
    }
    builder.parse_default_env().init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let scenario = load_scenario(&cli.scenario).with_context(|| format!("Cannot load scenario {}", cli.scenario.display()))?;
    info!(
        "Loaded scenario {}: {} vehicles, {} saved paths",
        cli.scenario.display(),
        scenario.vehicles.len(),
        scenario.saved_paths.len()
    );
    if cli.check {
        info!("Scenario is valid");
        return Ok(());
    }

    let config = RunConfig::discover(cli.config.as_deref(), &cli.scenario).map_err(|e| anyhow!(e))?;
    let overrides = RunOverrides {
        frequency: cli.frequency,
        repeat: cli.repeat,
        log_format: cli.log_format,
        log_file: cli.log_file,
    };
    let resolved = resolve(&overrides, &config, chrono::Utc::now()).map_err(|e| anyhow!(e))?;

    let logger = TickLogger::open(&resolved.log_path, resolved.log_format)?;
    info!("Writing {} tick log to {}", resolved.log_format, resolved.log_path.display());

    // The executor task borrows both for the whole process lifetime
    let scenario: &'static Scenario = Box::leak(Box::new(scenario));
    let logger: &'static TickLogger = Box::leak(Box::new(logger));
    let settings = resolved.settings;
    let (done_tx, done_rx) = mpsc::channel();

    // Spawn Embassy executor on a dedicated background thread
    thread::Builder::new()
        .name("embassy-executor".to_string())
        .spawn(move || {
            let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
            executor.run(|spawner| embassy_init(spawner, scenario, settings, logger, done_tx));
        })
        .context("Failed to spawn executor thread")?;

    let summary = done_rx.recv().context("Executor stopped before the simulation finished")??;
    info!(
        "Run finished: {} repeat(s), {} vehicles driven, {} skipped, {} ticks, {} packets sent, {} send failures",
        summary.repeats_completed,
        summary.vehicles_driven,
        summary.vehicles_skipped,
        summary.ticks,
        summary.packets_sent,
        summary.send_failures
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    // The executor thread never returns on its own
    std::process::exit(0);
}
