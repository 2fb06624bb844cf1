//! Durable per-tick recording.
//!
//! - `record`: the `LogRecord` and its CSV / NDJSON line encodings
//! - `logger`: the shared `TickLogger` and the `RecordSink` seam used by drivers
//! - `reader`: loading recorded logs back as saved paths

pub mod logger;
pub mod reader;
pub mod record;

pub use logger::{LogFormat, RecordSink, TickLogger};
pub use record::LogRecord;
