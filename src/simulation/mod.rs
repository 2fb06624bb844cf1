//! V2X simulation core.
//!
//! Turns a scenario of vehicles and waypoints into paced, per-tick telemetry:
//! - Path resolution (inline path or saved-path fallback)
//! - Per-segment interpolation with segment-constant heading and speed
//! - Per-vehicle drivers sending packets and logging every tick
//! - Scenario-level orchestration across repeats
//!
//! ## Module Organization
//!
//! - `types`: Scenario data model and the ephemeral `Tick`
//! - `geo`: Haversine distance and initial bearing
//! - `packet`: Fixed 72-byte wire encoding
//! - `path`: Path resolution policy
//! - `interpolate`: Lazy per-segment tick sequence
//! - `pacing`: The `Pacer` seam over `embassy_time::Timer` and bounded pause durations
//! - `transport`: Datagram transport seam and its UDP implementation
//! - `vehicle`: Per-vehicle driver state machine
//! - `orchestrator`: Concurrent run loop and the executor entry task
//!
//! ## Public API
//!
//! The main entry point is `simulation_task`, which should be spawned by the
//! Embassy executor. `run` is the executor-agnostic core it wraps.

pub mod geo;
pub mod interpolate;
pub mod orchestrator;
pub mod pacing;
pub mod packet;
pub mod path;
pub mod transport;
pub mod types;
pub mod vehicle;

pub use orchestrator::{RunSettings, RunSummary, simulation_task};
pub use types::Scenario;
