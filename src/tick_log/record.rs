//! Per-tick log record and its CSV / NDJSON line encodings.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::simulation::types::{Coordinate, Tick, V2xState};

/// Header row written once at the top of CSV tick logs.
pub const CSV_HEADER: &str =
    "timestamp,vehicleId,lat,lng,speed,heading,eebl,lightBar,siren,flasher,foglight,drl,wiper,leftSignal,rightSignal";

const CSV_COLUMNS: usize = 15;

/// One emitted tick as handed to the logger.
///
/// `timestamp` is ISO-8601 captured at emission and is independent of the
/// epoch-ms stamp embedded in the packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub timestamp: String,
    pub vehicle_id: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
    pub heading: f64,
    pub eebl: bool,
    pub light_bar: bool,
    pub siren: bool,
    pub flasher: bool,
    pub foglight: bool,
    pub drl: bool,
    pub wiper: u8,
    pub left_signal: bool,
    pub right_signal: bool,
}

impl LogRecord {
    /// Build a record for `tick`, stamped now.
    pub fn from_tick(vehicle_id: &str, tick: &Tick) -> Self {
        let v2x = &tick.v2x;
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            vehicle_id: vehicle_id.to_string(),
            lat: tick.position.lat,
            lng: tick.position.lng,
            speed: tick.speed_kmh,
            heading: tick.heading_deg,
            eebl: v2x.eebl,
            light_bar: v2x.light_bar,
            siren: v2x.siren,
            flasher: v2x.flasher,
            foglight: v2x.foglight,
            drl: v2x.drl,
            wiper: v2x.wiper,
            left_signal: v2x.left_signal,
            right_signal: v2x.right_signal,
        }
    }

    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Signalling state recorded for this tick, with the speed as velocity.
    pub fn v2x(&self) -> V2xState {
        V2xState {
            eebl: self.eebl,
            light_bar: self.light_bar,
            siren: self.siren,
            flasher: self.flasher,
            foglight: self.foglight,
            drl: self.drl,
            wiper: self.wiper,
            left_signal: self.left_signal,
            right_signal: self.right_signal,
            velocity_kmh: self.speed,
        }
    }

    /// CSV row matching `CSV_HEADER`, booleans as 0/1, no trailing newline.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.timestamp,
            escape_csv_field(&self.vehicle_id),
            self.lat,
            self.lng,
            self.speed,
            self.heading,
            self.eebl as u8,
            self.light_bar as u8,
            self.siren as u8,
            self.flasher as u8,
            self.foglight as u8,
            self.drl as u8,
            self.wiper,
            self.left_signal as u8,
            self.right_signal as u8,
        )
    }

    /// Parse a CSV row written by `to_csv_row`. Returns `None` for the header
    /// and anything malformed.
    pub fn from_csv_row(line: &str) -> Option<Self> {
        let fields = split_csv_row(line)?;
        if fields.len() != CSV_COLUMNS || fields[0] == "timestamp" {
            return None;
        }

        Some(Self {
            timestamp: fields[0].clone(),
            vehicle_id: fields[1].clone(),
            lat: fields[2].parse().ok()?,
            lng: fields[3].parse().ok()?,
            speed: fields[4].parse().ok()?,
            heading: fields[5].parse().ok()?,
            eebl: parse_flag(&fields[6])?,
            light_bar: parse_flag(&fields[7])?,
            siren: parse_flag(&fields[8])?,
            flasher: parse_flag(&fields[9])?,
            foglight: parse_flag(&fields[10])?,
            drl: parse_flag(&fields[11])?,
            wiper: fields[12].parse().ok()?,
            left_signal: parse_flag(&fields[13])?,
            right_signal: parse_flag(&fields[14])?,
        })
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }
}

fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Quote a field if it contains a separator, quote or line break.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV row honoring double-quoted fields. `None` on an unterminated quote.
fn split_csv_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::with_capacity(CSV_COLUMNS);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}
