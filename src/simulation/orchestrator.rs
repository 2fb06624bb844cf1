//! Scenario-level run loop.
//!
//! Repeats run one after another. Within a repeat every vehicle gets its own
//! driver future, and all of them are multiplexed on the calling task until
//! each reaches a terminal state. Nothing orders one vehicle's ticks against
//! another's.

use futures::future::join_all;
use std::sync::mpsc;

use super::pacing::{Pacer, TimerPacer};
use super::transport::{TransportFactory, UdpTransportFactory};
use super::types::{DEFAULT_FREQUENCY_HZ, Scenario};
use super::vehicle::{VehicleDriver, VehicleOutcome, VehicleReport};
use crate::tick_log::{RecordSink, TickLogger};

/// Knobs of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Default transmission frequency in Hz for segments without `freq`.
    pub frequency_hz: u32,
    /// How many times the whole scenario is replayed, sequentially.
    pub repeat_count: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            repeat_count: 1,
        }
    }
}

/// Totals across all repeats of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repeats_completed: u32,
    pub vehicles_driven: u64,
    pub vehicles_skipped: u64,
    pub ticks: u64,
    pub packets_sent: u64,
    pub send_failures: u64,
}

impl RunSummary {
    fn absorb(&mut self, report: &VehicleReport) {
        match report.outcome {
            VehicleOutcome::Completed => self.vehicles_driven += 1,
            VehicleOutcome::Skipped | VehicleOutcome::TransportUnavailable => self.vehicles_skipped += 1,
        }
        self.ticks += report.ticks;
        self.packets_sent += report.packets_sent;
        self.send_failures += report.send_failures;
    }
}

/// Run every vehicle of `scenario` concurrently, `repeat_count` times.
///
/// Always completes: skipped vehicles and failed sends only show up in the
/// returned summary.
pub async fn run<F: TransportFactory, S: RecordSink, P: Pacer>(
    scenario: &Scenario,
    settings: &RunSettings,
    transports: &F,
    sink: &S,
    pacer: &P,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for repeat in 1..=settings.repeat_count {
        log::info!(
            "Repeat {}/{}: starting {} vehicles",
            repeat,
            settings.repeat_count,
            scenario.vehicles.len()
        );

        let drivers = scenario.vehicles.iter().map(|vehicle| {
            VehicleDriver::new(vehicle, &scenario.saved_paths, settings.frequency_hz, transports, sink, pacer).run()
        });
        let reports = join_all(drivers).await;

        for report in &reports {
            summary.absorb(report);
        }
        summary.repeats_completed = repeat;
        log::info!("Repeat {}/{} finished", repeat, settings.repeat_count);
    }

    summary
}

/// Executor task running a full scenario over UDP, then closing the logger.
///
/// The result is reported on `done` so the main thread can exit with the
/// right status.
#[embassy_executor::task]
pub async fn simulation_task(
    scenario: &'static Scenario,
    settings: RunSettings,
    logger: &'static TickLogger,
    done: mpsc::Sender<anyhow::Result<RunSummary>>,
) {
    log::info!(
        "Simulating {} vehicles at {} Hz, {} repeat(s)",
        scenario.vehicles.len(),
        settings.frequency_hz,
        settings.repeat_count
    );

    let summary = run(scenario, &settings, &UdpTransportFactory, logger, &TimerPacer).await;
    let result = match logger.close().await {
        Ok(()) => Ok(summary),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to flush tick log")),
    };

    if done.send(result).is_err() {
        log::error!("Simulation finished but nobody is waiting for the result");
    }
}
