/// Bounded per-device temperature histories
pub mod device_history;

/// Trend classification over a device's history
pub mod trend;

pub use device_history::{DeviceHistory, HistoryStore};
pub use trend::{Trend, TREND_NOISE_BAND};
