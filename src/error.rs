use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading hardware sensors
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Sensor utility not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn subprocess: {0}")]
    SubprocessSpawn(String),

    #[error("Sensor utility exited with {status}: {stderr}")]
    ExecutionFailed { status: String, stderr: String },

    #[error("Sensor utility did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse output: {0}")]
    ParseError(String),

    #[error("System probe failed: {0}")]
    ProbeFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur when sending alerts
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Errors raised inside a monitor tick that are not sensor or delivery failures
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitor state lock poisoned: {0}")]
    StatePoisoned(&'static str),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
