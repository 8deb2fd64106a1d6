//! Layered settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `GOVWATCH_*` environment variables (`__` separates nested
//! keys, e.g. `GOVWATCH_MONITOR__STATS_PERIOD_MS=500`). CLI flags are
//! applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const ENV_PREFIX: &str = "GOVWATCH";

/// Upper bound on samples kept per chart series.
pub const MAX_CAPACITY: usize = 86_400;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub monitor: MonitorSettings,
    pub governor: GovernorSettings,
    pub summary: SummarySettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 5000,
            monitor: MonitorSettings::default(),
            governor: GovernorSettings::default(),
            summary: SummarySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub stats_period_ms: u64,
    pub chart_period_ms: u64,
    pub capacity: usize,
    pub fallback_interface: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stats_period_ms: 1000,
            chart_period_ms: 2000,
            capacity: 60,
            fallback_interface: "enp2s0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GovernorSettings {
    pub status_period_ms: u64,
    pub history_period_ms: u64,
    pub logs_period_ms: u64,
    pub speed_capacity: usize,
    pub default_quota_gb: f64,
    pub toggle_followup_ms: u64,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            status_period_ms: 1000,
            history_period_ms: 30_000,
            logs_period_ms: 2000,
            speed_capacity: 30,
            default_quota_gb: 150.0,
            toggle_followup_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub cards_period_ms: u64,
    pub status_period_ms: u64,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            cards_period_ms: 2000,
            status_period_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Settings {
    /// Load settings from the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("monitor.stats_period_ms", self.monitor.stats_period_ms),
            ("monitor.chart_period_ms", self.monitor.chart_period_ms),
            ("governor.status_period_ms", self.governor.status_period_ms),
            ("governor.history_period_ms", self.governor.history_period_ms),
            ("governor.logs_period_ms", self.governor.logs_period_ms),
            ("summary.cards_period_ms", self.summary.cards_period_ms),
            ("summary.status_period_ms", self.summary.status_period_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ];
        for (key, value) in periods {
            if value == 0 {
                bail!("{key} must be greater than zero");
            }
        }
        let capacities = [
            ("monitor.capacity", self.monitor.capacity),
            ("governor.speed_capacity", self.governor.speed_capacity),
        ];
        for (key, capacity) in capacities {
            if capacity == 0 {
                bail!("{key} must be greater than zero");
            }
            if capacity > MAX_CAPACITY {
                bail!("{key} must be at most {MAX_CAPACITY}");
            }
        }
        if !(self.governor.default_quota_gb.is_finite() && self.governor.default_quota_gb > 0.0) {
            bail!("governor.default_quota_gb must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.monitor.capacity, 60);
        assert_eq!(settings.governor.speed_capacity, 30);
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
endpoint = "http://gov.local:9000"

[monitor]
capacity = 120
fallback_interface = "eth0"

[governor]
history_period_ms = 60000
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.endpoint, "http://gov.local:9000");
        assert_eq!(settings.monitor.capacity, 120);
        assert_eq!(settings.monitor.fallback_interface, "eth0");
        // untouched keys keep their defaults
        assert_eq!(settings.monitor.stats_period_ms, 1000);
        assert_eq!(settings.governor.history_period_ms, 60_000);
        assert_eq!(settings.summary, SummarySettings::default());
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[summary]\ncards_period_ms = 0").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("summary.cards_period_ms"));
    }

    #[test]
    fn test_capacity_bounds() {
        let mut settings = Settings::default();
        settings.governor.speed_capacity = MAX_CAPACITY;
        assert!(settings.validate().is_ok());

        settings.governor.speed_capacity = MAX_CAPACITY + 1;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("governor.speed_capacity"));

        settings.governor.speed_capacity = 30;
        settings.monitor.capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/govwatch.toml"))).is_err());
    }
}
