/// Scheduled checks, alerting and the monitor lifecycle
pub mod scheduler;

/// Interactive temperature and status reports
pub mod query;

pub use scheduler::{
    Monitor, MonitorHandle, MonitorSettings, MonitorState, TickOutcome, CRASH_COOLDOWN,
};
