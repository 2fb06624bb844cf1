//! Reading previously recorded tick logs back as saved paths.
//!
//! The format is detected from the first non-empty line: a line starting with
//! `{` means NDJSON, anything else is treated as CSV with a header row.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::logger::LogFormat;
use super::record::LogRecord;
use crate::simulation::types::Waypoint;

/// Buffer size for reading log files (8KB).
const BUFFER_SIZE: usize = 8 * 1024;

/// Read every record in `path` belonging to `vehicle_id`, in file order.
pub fn read_vehicle_records(path: &Path, vehicle_id: &str) -> io::Result<Vec<LogRecord>> {
    let reader = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
    let mut detected = None;
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let format = *detected.get_or_insert_with(|| detect_format(line));
        let parsed = match format {
            LogFormat::Csv => LogRecord::from_csv_row(line),
            LogFormat::Json => LogRecord::from_json_line(line),
        };

        match parsed {
            Some(record) if record.vehicle_id == vehicle_id => records.push(record),
            Some(_) => {}
            None => log::debug!("{}:{}: skipping unparseable tick log line", path.display(), index + 1),
        }
    }

    Ok(records)
}

/// Turn recorded ticks into one-hop waypoints.
///
/// Each waypoint carries the recorded speed and signalling state, which then
/// governs the replayed segment arriving at it.
pub fn records_to_waypoints(records: &[LogRecord]) -> Vec<Waypoint> {
    records
        .iter()
        .map(|record| {
            let position = record.position();
            Waypoint {
                hops: Some(1),
                v2x: record.v2x(),
                ..Waypoint::at(position.lat, position.lng)
            }
        })
        .collect()
}

fn detect_format(first_line: &str) -> LogFormat {
    if first_line.trim_start().starts_with('{') {
        LogFormat::Json
    } else {
        LogFormat::Csv
    }
}
