//! Configuration management
//!
//! The configuration is a single TOML file loaded once at startup. Every
//! field has a default so a partial file (or no file at all) is valid.

use crate::error::ConfigError;
use crate::events::DeviceCategory;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Most samples a device history may hold
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Longest accepted check interval, one week
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Start the background monitor on launch
    pub enabled: bool,
    /// Minutes between scheduled checks
    pub check_interval_minutes: u64,
    /// Minutes of history used for trend estimation
    pub trend_window_minutes: u64,
    /// Device code (`CPU`, `Motherboard`, `WIFI`, `NVMe`) to threshold in °C
    pub thresholds: BTreeMap<String, f64>,
    /// Notification targets receiving alerts
    pub alert_groups: Vec<String>,
    pub sensors: SensorsConfig,
    pub notifier: NotifierConfig,
}

/// How the sensor utility is invoked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorsConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
    /// Read captured `sensors` output from this file instead of running the command
    pub replay_file: Option<PathBuf>,
}

/// Notification backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Write alerts to the application log
    Log,
    /// POST alerts as JSON to an HTTP endpoint
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout")]
        timeout_seconds: u64,
    },
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            check_interval_minutes: 5,
            trend_window_minutes: 30,
            thresholds: BTreeMap::new(),
            alert_groups: Vec::new(),
            sensors: SensorsConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            command: "sensors".to_string(),
            args: Vec::new(),
            timeout_seconds: 30,
            replay_file: None,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig::Log
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// Threshold codes that do not name a known device are only warned about;
    /// those entries can never match a reading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "check_interval_minutes must be greater than zero".to_string(),
            ));
        }

        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "check_interval_minutes must not exceed {}",
                MAX_CHECK_INTERVAL_MINUTES
            )));
        }

        match self.samples_in_window() {
            Some(samples) if samples <= MAX_HISTORY_CAPACITY => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "trend_window_minutes / check_interval_minutes must not exceed {}",
                    MAX_HISTORY_CAPACITY - 1
                )))
            }
        }

        if self.sensors.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "sensors.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.sensors.command.trim().is_empty() && self.sensors.replay_file.is_none() {
            return Err(ConfigError::ValidationError(
                "sensors.command must not be empty".to_string(),
            ));
        }

        for (code, threshold) in &self.thresholds {
            if !threshold.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "threshold for {} must be a finite number",
                    code
                )));
            }
            if DeviceCategory::from_code(code).is_none() {
                warn!("Ignoring threshold for unknown device '{}'", code);
            }
        }

        if let NotifierConfig::Webhook { url, .. } = &self.notifier {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "notifier.url must not be empty for the webhook backend".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Number of samples kept per device: `window / interval + 1`, clamped
    /// to `2..=MAX_HISTORY_CAPACITY`
    pub fn history_capacity(&self) -> usize {
        self.samples_in_window()
            .unwrap_or(MAX_HISTORY_CAPACITY)
            .clamp(2, MAX_HISTORY_CAPACITY)
    }

    /// `window / interval + 1`, or `None` if it does not fit in `usize`
    fn samples_in_window(&self) -> Option<usize> {
        let interval = self.check_interval_minutes.max(1);
        usize::try_from(self.trend_window_minutes / interval)
            .ok()?
            .checked_add(1)
    }
}
