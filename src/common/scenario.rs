//! Scenario loading, parsing, and validation logic.
//!
//! Reads the scenario JSON, resolves saved paths that point at recorded tick
//! logs, and rejects structurally invalid input before the simulation starts.

use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::simulation::pacing::MAX_PAUSE_SECS;
use crate::simulation::types::{Scenario, Waypoint};
use crate::tick_log::reader::{read_vehicle_records, records_to_waypoints};

/// Error type for scenario loading failures.
#[derive(Debug)]
pub enum ScenarioLoadError {
    FileReadError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioLoadError::FileReadError(msg) => write!(f, "Failed to read file: {}", msg),
            ScenarioLoadError::ParseError(msg) => write!(f, "Failed to parse JSON: {}", msg),
            ScenarioLoadError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ScenarioLoadError {}

/// Load, resolve and validate a scenario file.
///
/// # Parameters
///
/// * `path` - Path to the scenario JSON file
///
/// # Returns
///
/// A validated `Scenario` whose saved paths all carry inline waypoints, or an
/// error describing the first problem found.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
        .map_err(|e| ScenarioLoadError::FileReadError(e.to_string()))?;

    let mut scenario = parse_scenario(&data)?;

    // Saved paths recorded as tick logs are resolved relative to the scenario file
    let base_dir = path.parent().unwrap_or(Path::new("."));
    resolve_saved_logs(&mut scenario, base_dir)?;
    pin_targets(&mut scenario)?;

    validate_scenario(&scenario).map_err(ScenarioLoadError::ValidationError)?;

    Ok(scenario)
}

/// Parse scenario JSON without touching the filesystem or validating.
pub fn parse_scenario(data: &str) -> Result<Scenario, ScenarioLoadError> {
    serde_json::from_str(data)
        .context("Invalid JSON format")
        .map_err(|e| ScenarioLoadError::ParseError(format!("{:#}", e)))
}

/// Replace every `logFile` saved path with the waypoints recorded in it.
fn resolve_saved_logs(scenario: &mut Scenario, base_dir: &Path) -> Result<(), ScenarioLoadError> {
    for saved in &mut scenario.saved_paths {
        let Some(log_file) = saved.log_file.as_deref() else {
            continue;
        };
        if !saved.path.is_empty() {
            return Err(ScenarioLoadError::ValidationError(format!(
                "Saved path for vehicle {} has both 'path' and 'logFile'",
                saved.vehicle_id
            )));
        }

        let full_path = base_dir.join(log_file);
        let records = read_vehicle_records(&full_path, &saved.vehicle_id)
            .with_context(|| format!("Failed to read saved tick log: {}", full_path.display()))
            .map_err(|e| ScenarioLoadError::FileReadError(format!("{:#}", e)))?;

        log::debug!(
            "Loaded {} recorded ticks for vehicle {} from {}",
            records.len(),
            saved.vehicle_id,
            full_path.display()
        );
        saved.path = records_to_waypoints(&records);
    }

    Ok(())
}

/// Resolve every vehicle's destination once, before the executor starts.
fn pin_targets(scenario: &mut Scenario) -> Result<(), ScenarioLoadError> {
    for vehicle in &mut scenario.vehicles {
        // Left for validation to report with a clearer message
        if vehicle.ip.as_deref().is_some_and(|ip| ip.trim().is_empty()) {
            continue;
        }
        let target = vehicle.lookup_target().map_err(|e| {
            ScenarioLoadError::ValidationError(format!(
                "Vehicle {} has unresolvable address {}:{}: {}",
                vehicle.id,
                vehicle.host(),
                vehicle.port(),
                e
            ))
        })?;
        log::debug!("Vehicle {} resolved to {}", vehicle.id, target);
        vehicle.target = Some(target);
    }

    Ok(())
}

/// Validate a parsed scenario.
///
/// Checks for issues that would make the run meaningless or crash it:
/// - No vehicles at all
/// - Empty or duplicate vehicle ids
/// - Coordinates outside [-90, 90] / [-180, 180] or non-finite
/// - Zero hop counts, frequencies or wait times outside what the timer can pace
/// - Empty or unresolvable hosts and port 0
/// - Saved paths with neither waypoints nor a log file
///
/// Vehicles with fewer than two waypoints are allowed; they are skipped at run time.
///
/// # Returns
///
/// `Ok(())` if validation passes, `Err(String)` with error description otherwise.
pub fn validate_scenario(scenario: &Scenario) -> Result<(), String> {
    if scenario.vehicles.is_empty() {
        return Err("Scenario must contain at least one vehicle".to_string());
    }

    let mut vehicle_ids = HashSet::new();
    for vehicle in &scenario.vehicles {
        if vehicle.id.trim().is_empty() {
            return Err("Vehicle id must not be empty".to_string());
        }
        if !vehicle_ids.insert(vehicle.id.as_str()) {
            return Err(format!("Duplicate vehicle id found: {}", vehicle.id));
        }
        if let Some(ip) = &vehicle.ip {
            if ip.trim().is_empty() {
                return Err(format!("Vehicle {} has an empty 'ip'", vehicle.id));
            }
        }
        if vehicle.port == Some(0) {
            return Err(format!("Vehicle {} has invalid port 0", vehicle.id));
        }
        if vehicle.target.is_none() {
            if let Err(e) = vehicle.lookup_target() {
                return Err(format!(
                    "Vehicle {} has unresolvable address {}:{}: {}",
                    vehicle.id,
                    vehicle.host(),
                    vehicle.port(),
                    e
                ));
            }
        }
        validate_waypoints(&vehicle.path, &format!("Vehicle {}", vehicle.id))?;
    }

    for saved in &scenario.saved_paths {
        if saved.path.is_empty() && saved.log_file.is_none() {
            return Err(format!(
                "Saved path for vehicle {} needs either 'path' or 'logFile'",
                saved.vehicle_id
            ));
        }
        validate_waypoints(&saved.path, &format!("Saved path for vehicle {}", saved.vehicle_id))?;
    }

    Ok(())
}

fn validate_waypoints(path: &[Waypoint], owner: &str) -> Result<(), String> {
    for (idx, waypoint) in path.iter().enumerate() {
        if !waypoint.lat.is_finite() || !(-90.0..=90.0).contains(&waypoint.lat) {
            return Err(format!(
                "{} waypoint {} latitude {} outside [-90, 90]",
                owner, idx, waypoint.lat
            ));
        }
        if !waypoint.lng.is_finite() || !(-180.0..=180.0).contains(&waypoint.lng) {
            return Err(format!(
                "{} waypoint {} longitude {} outside [-180, 180]",
                owner, idx, waypoint.lng
            ));
        }
        if waypoint.hops == Some(0) {
            return Err(format!("{} waypoint {} has hops 0, must be at least 1", owner, idx));
        }
        if let Some(freq) = waypoint.freq {
            if !freq.is_finite() || freq < 1.0 / MAX_PAUSE_SECS {
                return Err(format!(
                    "{} waypoint {} has invalid freq {}, must be at least {:e} Hz",
                    owner,
                    idx,
                    freq,
                    1.0 / MAX_PAUSE_SECS
                ));
            }
        }
        if let Some(wait) = waypoint.wait_time {
            if !wait.is_finite() || !(0.0..=MAX_PAUSE_SECS).contains(&wait) {
                return Err(format!(
                    "{} waypoint {} has invalid waitTime {}, must be within [0, {}] seconds",
                    owner, idx, wait, MAX_PAUSE_SECS
                ));
            }
        }
        if !waypoint.v2x.velocity_kmh.is_finite() {
            return Err(format!("{} waypoint {} has non-finite velocityKmh", owner, idx));
        }
    }

    Ok(())
}
