// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `HUBTIPS__*` environment variables (`__` separates nested keys, e.g.
//! `HUBTIPS__DISPATCHER__START_DELAY_MS=500`).

use crate::error::{HubTipsError, Result};
use crate::types::Breakpoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay before the first automatic tip of a session
pub const DEFAULT_START_DELAY_MS: u64 = 3_000;

/// How long a tip stays up before it is auto-dismissed
pub const DEFAULT_DISPLAY_MS: u64 = 20_000;

/// Minimum spacing between automatic tips
pub const DEFAULT_RATE_LIMIT_HOURS: i64 = 24;

/// Runtime settings consumed by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Delay between `start` and the automatic pick
    pub start_delay: Duration,
    /// Time a tip stays visible
    pub display_duration: Duration,
    /// Window during which a shown tip blocks another automatic one
    pub rate_limit: chrono::Duration,
    /// Breakpoints on which automatic tips are suppressed
    pub small_breakpoints: Vec<Breakpoint>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(DEFAULT_START_DELAY_MS),
            display_duration: Duration::from_millis(DEFAULT_DISPLAY_MS),
            rate_limit: chrono::Duration::hours(DEFAULT_RATE_LIMIT_HOURS),
            small_breakpoints: vec![Breakpoint::Xs, Breakpoint::Sm],
        }
    }
}

impl DispatcherConfig {
    /// Whether automatic tips are suppressed on this breakpoint
    #[must_use]
    pub fn suppresses(&self, breakpoint: Breakpoint) -> bool {
        self.small_breakpoints.contains(&breakpoint)
    }
}

/// Dispatcher section of the config file, in plain units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Start delay in milliseconds
    pub start_delay_ms: u64,
    /// Display duration in milliseconds
    pub display_ms: u64,
    /// Rate-limit window in hours
    pub rate_limit_hours: i64,
    /// Breakpoints treated as mobile
    pub small_breakpoints: Vec<Breakpoint>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            start_delay_ms: DEFAULT_START_DELAY_MS,
            display_ms: DEFAULT_DISPLAY_MS,
            rate_limit_hours: DEFAULT_RATE_LIMIT_HOURS,
            small_breakpoints: vec![Breakpoint::Xs, Breakpoint::Sm],
        }
    }
}

impl TryFrom<&DispatcherSettings> for DispatcherConfig {
    type Error = HubTipsError;

    /// Fails on a negative or unrepresentable rate-limit window
    fn try_from(settings: &DispatcherSettings) -> Result<Self> {
        let hours = settings.rate_limit_hours;
        let rate_limit = (hours >= 0)
            .then(|| chrono::Duration::try_hours(hours))
            .flatten()
            .ok_or_else(|| {
                HubTipsError::Config(config::ConfigError::Message(format!(
                    "dispatcher.rate_limit_hours must be between 0 and {} (got {hours})",
                    i64::MAX / 1000 / 3600
                )))
            })?;

        Ok(Self {
            start_delay: Duration::from_millis(settings.start_delay_ms),
            display_duration: Duration::from_millis(settings.display_ms),
            rate_limit,
            small_breakpoints: settings.small_breakpoints.clone(),
        })
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the prefs file
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Dispatcher timings
    pub dispatcher: DispatcherSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
            dispatcher: DispatcherSettings::default(),
        }
    }
}

/// Platform data directory, or `./.hubtips` when none can be determined
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "hyperpolymath", "hubtips")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".hubtips"))
}

/// Config file read when `--config` is not given
fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "hubtips")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from disk and environment, falling back to defaults.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(default) = default_config_file() {
                builder = builder.add_source(config::File::from(default).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("HUBTIPS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    DispatcherConfig::try_from(&config.dispatcher)?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.start_delay, Duration::from_millis(3000));
        assert_eq!(config.display_duration, Duration::from_millis(20000));
        assert_eq!(config.rate_limit, chrono::Duration::days(1));
        assert!(config.suppresses(Breakpoint::Xs));
        assert!(config.suppresses(Breakpoint::Sm));
        assert!(!config.suppresses(Breakpoint::Md));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\n\n[dispatcher]\nstart_delay_ms = 10\nsmall_breakpoints = [\"xs\", \"sm\", \"md\"]"
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.dispatcher.start_delay_ms, 10);
        assert_eq!(config.dispatcher.display_ms, DEFAULT_DISPLAY_MS);

        let dispatcher = DispatcherConfig::try_from(&config.dispatcher).unwrap();
        assert!(dispatcher.suppresses(Breakpoint::Md));
    }

    #[test]
    fn test_default_settings_match_default_config() {
        let config = DispatcherConfig::try_from(&DispatcherSettings::default()).unwrap();
        assert_eq!(config, DispatcherConfig::default());
    }

    #[test]
    fn test_rate_limit_out_of_range_is_rejected() {
        for hours in [i64::MAX / 1000, i64::MAX, -1, i64::MIN] {
            let settings = DispatcherSettings {
                rate_limit_hours: hours,
                ..DispatcherSettings::default()
            };
            let err = DispatcherConfig::try_from(&settings).unwrap_err();
            assert!(matches!(err, HubTipsError::Config(_)), "{hours}: {err}");
        }

        let zero = DispatcherSettings {
            rate_limit_hours: 0,
            ..DispatcherSettings::default()
        };
        let config = DispatcherConfig::try_from(&zero).unwrap();
        assert_eq!(config.rate_limit, chrono::Duration::zero());
    }

    #[test]
    fn test_load_rejects_bad_rate_limit() {
        for hours in [i64::MAX / 1000, -5] {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            writeln!(file, "[dispatcher]\nrate_limit_hours = {hours}").unwrap();

            let err = load(Some(file.path())).unwrap_err();
            assert!(matches!(err, HubTipsError::Config(_)));
            assert!(err.to_string().contains("rate_limit_hours"), "{err}");
        }
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
