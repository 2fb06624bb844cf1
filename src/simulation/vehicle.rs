//! Per-vehicle driver.
//!
//! Each driver runs as an independent future that:
//! - Resolves the vehicle's path once
//! - Opens its own transport handle
//! - Walks every segment, honouring per-waypoint wait times
//! - Sends and logs each tick, then waits out the tick's pacing interval
//!
//! Ticks of one vehicle are strictly ordered; nothing is shared with other
//! drivers except the read-only scenario and the record sink.

use super::geo::distance_meters;
use super::interpolate::SegmentTicks;
use super::pacing::{Pacer, pause_from_secs};
use super::packet::encode;
use super::path::resolve;
use super::transport::{Transport, TransportFactory};
use super::types::{SavedPath, Vehicle, Waypoint};
use crate::tick_log::{LogRecord, RecordSink};

/// Lifecycle of one vehicle within a single repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Resolving,
    Running,
    Draining,
    Done,
    Skipped,
}

/// How a vehicle's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleOutcome {
    Completed,
    /// No inline or saved path with at least two waypoints.
    Skipped,
    /// The transport could not be opened for the vehicle's address.
    TransportUnavailable,
}

/// Per-vehicle counters reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleReport {
    pub vehicle_id: String,
    pub outcome: VehicleOutcome,
    pub ticks: u64,
    pub packets_sent: u64,
    pub send_failures: u64,
}

/// Drives one vehicle through its resolved path.
pub struct VehicleDriver<'a, F: TransportFactory, S: RecordSink, P: Pacer> {
    vehicle: &'a Vehicle,
    saved_paths: &'a [SavedPath],
    default_frequency_hz: u32,
    transports: &'a F,
    sink: &'a S,
    pacer: &'a P,
    state: DriverState,
    report: VehicleReport,
}

impl<'a, F: TransportFactory, S: RecordSink, P: Pacer> VehicleDriver<'a, F, S, P> {
    pub fn new(
        vehicle: &'a Vehicle,
        saved_paths: &'a [SavedPath],
        default_frequency_hz: u32,
        transports: &'a F,
        sink: &'a S,
        pacer: &'a P,
    ) -> Self {
        Self {
            vehicle,
            saved_paths,
            default_frequency_hz,
            transports,
            sink,
            pacer,
            state: DriverState::Idle,
            report: VehicleReport {
                vehicle_id: vehicle.id.clone(),
                outcome: VehicleOutcome::Skipped,
                ticks: 0,
                packets_sent: 0,
                send_failures: 0,
            },
        }
    }

    /// Run the vehicle to a terminal state and return its report.
    pub async fn run(mut self) -> VehicleReport {
        self.transition(DriverState::Resolving);
        let Some(path) = resolve(self.vehicle, self.saved_paths) else {
            log::info!("Vehicle {} has no usable path, skipping", self.vehicle.id);
            return self.finish(DriverState::Skipped, VehicleOutcome::Skipped);
        };

        let mut transport = match self.transports.open(self.vehicle) {
            Ok(transport) => transport,
            Err(e) => {
                log::warn!(
                    "Vehicle {}: cannot open transport to {}:{}: {}",
                    self.vehicle.id,
                    self.vehicle.host(),
                    self.vehicle.port(),
                    e
                );
                return self.finish(DriverState::Skipped, VehicleOutcome::TransportUnavailable);
            }
        };

        self.transition(DriverState::Running);
        log::debug!(
            "Vehicle {} starting: {} waypoints -> {}:{}",
            self.vehicle.id,
            path.len(),
            self.vehicle.host(),
            self.vehicle.port()
        );
        for (index, segment) in path.windows(2).enumerate() {
            self.drive_segment(index, &segment[0], &segment[1], &mut transport).await;
        }

        self.transition(DriverState::Draining);
        drop(transport);

        log::debug!(
            "Vehicle {} finished: {} ticks, {} sent, {} failed",
            self.vehicle.id,
            self.report.ticks,
            self.report.packets_sent,
            self.report.send_failures
        );
        self.finish(DriverState::Done, VehicleOutcome::Completed)
    }

    async fn drive_segment(&mut self, index: usize, from: &Waypoint, to: &Waypoint, transport: &mut F::Handle) {
        if let Some(wait) = from.wait_time.filter(|secs| *secs > 0.0) {
            log::debug!("Vehicle {} waiting {:.3}s before segment {}", self.vehicle.id, wait, index);
            self.pacer.pause(pause_from_secs(wait)).await;
        }

        let ticks = SegmentTicks::new(from, to, self.default_frequency_hz);
        log::trace!(
            "Vehicle {} segment {}: {:.1} m in {} ticks every {} us",
            self.vehicle.id,
            index,
            distance_meters(&from.coordinate(), &to.coordinate()),
            ticks.len(),
            ticks.interval().as_micros()
        );

        for tick in ticks {
            self.report.ticks += 1;

            // Delivery is best-effort: a failed datagram is counted and dropped.
            match transport.send(&encode(&tick)) {
                Ok(()) => self.report.packets_sent += 1,
                Err(e) => {
                    self.report.send_failures += 1;
                    log::trace!("Vehicle {}: send failed: {}", self.vehicle.id, e);
                }
            }

            self.sink.log(LogRecord::from_tick(&self.vehicle.id, &tick)).await;
            self.pacer.pause(tick.interval).await;
        }
    }

    fn transition(&mut self, next: DriverState) {
        log::trace!("Vehicle {}: {:?} -> {:?}", self.vehicle.id, self.state, next);
        self.state = next;
    }

    fn finish(mut self, terminal: DriverState, outcome: VehicleOutcome) -> VehicleReport {
        self.transition(terminal);
        self.report.outcome = outcome;
        self.report
    }
}
