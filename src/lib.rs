/// Error types for the temperature monitor
pub mod error;

/// Device categories, readings and sensor snapshots
pub mod events;

/// Configuration management
pub mod config;

/// Sensor and system usage collectors
pub mod collectors;

/// Per-device temperature history and trends
pub mod history;

/// Threshold evaluation and alert delivery
pub mod alerts;

/// Background monitor and interactive reports
pub mod monitor;

// Re-export commonly used types
pub use config::Config;
pub use error::{AlertError, CollectorError, ConfigError, MonitorError};
pub use monitor::{Monitor, MonitorHandle, MonitorState, TickOutcome};
