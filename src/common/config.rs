//! Run configuration: TOML file plus command-line overrides.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::simulation::RunSettings;
use crate::simulation::types::DEFAULT_FREQUENCY_HZ;
use crate::tick_log::LogFormat;

/// Directory for generated tick logs when nothing else is configured.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Optional run configuration read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    /// Default transmission frequency in Hz
    pub frequency: Option<u32>,
    /// Number of sequential scenario repeats
    pub repeat: Option<u32>,
    pub log_format: Option<LogFormat>,
    /// Directory receiving timestamped tick logs
    pub log_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the config.toml file
    ///
    /// # Returns
    /// * `Ok(RunConfig)` if the file was successfully loaded and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Derive the config path from a scenario file path.
    ///
    /// Replaces the scenario filename with "config.toml" in the same directory.
    pub fn config_path_from_scenario(scenario_path: &Path) -> PathBuf {
        scenario_path.parent().unwrap_or(Path::new(".")).join("config.toml")
    }

    /// Load the explicit config, or the one next to the scenario if present.
    pub fn discover(explicit: Option<&Path>, scenario_path: &Path) -> Result<Self, String> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let implicit = Self::config_path_from_scenario(scenario_path);
                if implicit.is_file() {
                    log::debug!("Using run configuration {}", implicit.display());
                    Self::load(&implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Values given on the command line; they win over the TOML file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub frequency: Option<u32>,
    pub repeat: Option<u32>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    pub settings: RunSettings,
    pub log_format: LogFormat,
    pub log_path: PathBuf,
}

/// Merge command line, file and defaults into the final run parameters.
///
/// `now` names the default log file so that each run gets its own.
pub fn resolve(overrides: &RunOverrides, config: &RunConfig, now: DateTime<Utc>) -> Result<ResolvedRun, String> {
    let frequency_hz = overrides.frequency.or(config.frequency).unwrap_or(DEFAULT_FREQUENCY_HZ);
    if frequency_hz == 0 {
        return Err("Frequency must be positive".to_string());
    }
    let repeat_count = overrides.repeat.or(config.repeat).unwrap_or(1);
    if repeat_count == 0 {
        return Err("Repeat count must be positive".to_string());
    }

    let log_format = overrides.log_format.or(config.log_format).unwrap_or_default();
    let log_path = match &overrides.log_file {
        Some(path) => path.clone(),
        None => {
            let dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
            dir.join(format!("v2x-{}.{}", now.format("%Y%m%dT%H%M%S"), log_format.extension()))
        }
    };

    Ok(ResolvedRun {
        settings: RunSettings {
            frequency_hz,
            repeat_count,
        },
        log_format,
        log_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let resolved = resolve(&RunOverrides::default(), &RunConfig::default(), now()).unwrap();
        assert_eq!(resolved.settings, RunSettings::default());
        assert_eq!(resolved.log_format, LogFormat::Csv);
        assert_eq!(resolved.log_path, Path::new("logs").join("v2x-20260314T150926.csv"));
    }

    #[test]
    fn command_line_wins_over_file() {
        let config: RunConfig = toml::from_str(
            r#"
            frequency = 5
            repeat = 4
            log-format = "json"
            log-dir = "/tmp/v2x-runs"
            "#,
        )
        .unwrap();
        let overrides = RunOverrides {
            frequency: Some(25),
            ..Default::default()
        };

        let resolved = resolve(&overrides, &config, now()).unwrap();
        assert_eq!(resolved.settings.frequency_hz, 25);
        assert_eq!(resolved.settings.repeat_count, 4);
        assert_eq!(resolved.log_format, LogFormat::Json);
        assert_eq!(resolved.log_path, Path::new("/tmp/v2x-runs/v2x-20260314T150926.ndjson"));

        let explicit = RunOverrides {
            log_file: Some(PathBuf::from("out.csv")),
            log_format: Some(LogFormat::Csv),
            ..Default::default()
        };
        let resolved = resolve(&explicit, &config, now()).unwrap();
        assert_eq!(resolved.log_path, PathBuf::from("out.csv"));
        assert_eq!(resolved.log_format, LogFormat::Csv);
    }

    #[test]
    fn zero_frequency_or_repeat_is_rejected() {
        let zero_freq = RunOverrides {
            frequency: Some(0),
            ..Default::default()
        };
        assert!(resolve(&zero_freq, &RunConfig::default(), now()).is_err());

        let config = RunConfig {
            repeat: Some(0),
            ..Default::default()
        };
        assert!(resolve(&RunOverrides::default(), &config, now()).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<RunConfig>("frequncy = 5").is_err());
    }

    #[test]
    fn config_path_sits_next_to_scenario() {
        assert_eq!(
            RunConfig::config_path_from_scenario(Path::new("scenarios/city.json")),
            Path::new("scenarios/config.toml")
        );
    }

    #[test]
    fn discover_without_file_gives_defaults() {
        let scenario = std::env::temp_dir().join(format!("v2x-sim-config-{}", std::process::id())).join("s.json");
        assert_eq!(RunConfig::discover(None, &scenario).unwrap(), RunConfig::default());
        assert!(RunConfig::discover(Some(Path::new("/no/such/config.toml")), &scenario).is_err());
    }
}
