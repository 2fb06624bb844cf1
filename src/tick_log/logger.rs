//! Durable tick logger shared by all vehicle drivers.
//!
//! Drivers hand records over through `RecordSink::log`. The writer sits behind
//! an async mutex so each record is appended as one complete line before the
//! next driver gets the lock.

use anyhow::Context;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::record::{CSV_HEADER, LogRecord};

/// On-disk encoding of the tick log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Header row plus one comma-separated row per tick.
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            LogFormat::Csv => "csv",
            LogFormat::Json => "ndjson",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Csv => write!(f, "csv"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Where the simulation core sends one record per tick.
pub trait RecordSink {
    /// Append one record. Resolves once the record has been written.
    fn log(&self, record: LogRecord) -> impl Future<Output = ()>;
}

/// Format-aware line writer.
struct RecordWriter {
    out: BufWriter<Box<dyn Write + Send>>,
    format: LogFormat,
}

impl RecordWriter {
    fn new(out: Box<dyn Write + Send>, format: LogFormat) -> io::Result<Self> {
        let mut writer = Self {
            out: BufWriter::new(out),
            format,
        };
        if format == LogFormat::Csv {
            writeln!(writer.out, "{}", CSV_HEADER)?;
        }
        Ok(writer)
    }

    fn write(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = match self.format {
            LogFormat::Csv => record.to_csv_row(),
            LogFormat::Json => record.to_json_line()?,
        };
        writeln!(self.out, "{}", line)
    }

    fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Tick logger writing to a file (or any `Write`) in CSV or NDJSON.
pub struct TickLogger {
    writer: Mutex<CriticalSectionRawMutex, Option<RecordWriter>>,
}

impl TickLogger {
    /// Create (truncate) the log file, creating parent directories as needed.
    pub fn open(path: &Path, format: LogFormat) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
        Self::from_writer(Box::new(file), format).with_context(|| format!("Failed to write log header to {}", path.display()))
    }

    pub fn from_writer(out: Box<dyn Write + Send>, format: LogFormat) -> io::Result<Self> {
        Ok(Self {
            writer: Mutex::new(Some(RecordWriter::new(out, format)?)),
        })
    }

    /// Flush and release the underlying writer. Later records are dropped.
    pub async fn close(&self) -> io::Result<()> {
        match self.writer.lock().await.take() {
            Some(writer) => writer.finish(),
            None => Ok(()),
        }
    }
}

impl RecordSink for TickLogger {
    async fn log(&self, record: LogRecord) {
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => {
                if let Err(e) = writer.write(&record) {
                    log::error!("Failed to write tick record for {}: {}", record.vehicle_id, e);
                }
            }
            None => log::warn!("Tick logger already closed, dropping record for {}", record.vehicle_id),
        }
    }
}
