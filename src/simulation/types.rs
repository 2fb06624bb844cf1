//! Type definitions for the simulation.
//!
//! Contains the scenario data model (vehicles, waypoints, saved paths, V2X
//! signalling state) as deserialized from the scenario JSON, plus the
//! ephemeral `Tick` that flows from the interpolator to transmission and
//! logging.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Transmission frequency used when neither the CLI nor a waypoint overrides it.
pub const DEFAULT_FREQUENCY_HZ: u32 = 10;

/// Destination host for vehicles without an explicit `ip`.
pub const DEFAULT_VEHICLE_IP: &str = "127.0.0.1";

/// Destination port for vehicles without an explicit `port`.
pub const DEFAULT_VEHICLE_PORT: u16 = 2021;

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Signalling state and road speed for the segment arriving at a waypoint.
///
/// Every field is optional in the scenario file; absence means off / zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct V2xState {
    /// Emergency electronic brake light.
    pub eebl: bool,
    pub light_bar: bool,
    pub siren: bool,
    pub flasher: bool,
    pub foglight: bool,
    /// Daytime running lights.
    pub drl: bool,
    /// Wiper intensity level, 0 = off.
    pub wiper: u8,
    pub left_signal: bool,
    pub right_signal: bool,
    pub velocity_kmh: f64,
}

/// A scripted stop along a vehicle's path.
///
/// `hops`, `freq` and `v2x` describe the segment leading INTO this waypoint;
/// `wait_time` is the pause before departing it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub hops: Option<u32>,
    #[serde(default)]
    pub freq: Option<f64>,
    /// Seconds to pause before departing this waypoint.
    #[serde(default)]
    pub wait_time: Option<f64>,
    #[serde(default)]
    pub v2x: V2xState,
}

impl Waypoint {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            hops: None,
            freq: None,
            wait_time: None,
            v2x: V2xState::default(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Tick count of the segment arriving at this waypoint.
    pub fn hops(&self) -> u32 {
        self.hops.unwrap_or(1)
    }
}

/// A simulated vehicle as declared in the scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    #[serde(default)]
    pub path: Vec<Waypoint>,
    /// Destination host (IP literal or resolvable name).
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Destination resolved by the scenario loader, so drivers never block on name lookup.
    #[serde(skip)]
    pub target: Option<SocketAddr>,
}

impl Vehicle {
    pub fn host(&self) -> &str {
        self.ip.as_deref().unwrap_or(DEFAULT_VEHICLE_IP)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_VEHICLE_PORT)
    }

    /// Look up `host():port()`, taking the first address returned.
    pub fn lookup_target(&self) -> io::Result<SocketAddr> {
        let (host, port) = (self.host(), self.port());
        (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, format!("{host}:{port} did not resolve to any address"))
        })
    }
}

/// Fallback path keyed by vehicle identifier.
///
/// Either carries `path` inline or names a previously recorded tick log in
/// `log_file`; the scenario loader replaces the latter with its waypoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPath {
    pub vehicle_id: String,
    #[serde(default)]
    pub path: Vec<Waypoint>,
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Root structure representing the entire scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub saved_paths: Vec<SavedPath>,
}

/// One discrete simulated instant: one packet and one log record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub position: Coordinate,
    pub speed_kmh: f64,
    pub heading_deg: f64,
    pub v2x: V2xState,
    /// Pause after this tick before the next one fires.
    pub interval: Duration,
}
