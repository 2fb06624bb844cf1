//! Shared input handling: scenario files and run configuration.

pub mod config;
pub mod scenario;
