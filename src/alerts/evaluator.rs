//! Threshold evaluation for temperature readings
//!
//! Compares the readings of one sampling pass against the configured
//! per-device ceilings and composes the alert text sent to notification
//! targets.

use crate::events::{format_celsius, DeviceCategory, SensorSnapshot};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// First line of every alert message
pub const ALERT_BANNER: &str = "⚠️ 服务器高温告警 ⚠️";

/// Per-device temperature ceilings in °C, fixed for the process lifetime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdConfig {
    limits: HashMap<DeviceCategory, f64>,
}

impl ThresholdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration codes; unknown codes are dropped with a warning
    pub fn from_codes(codes: &BTreeMap<String, f64>) -> Self {
        let mut thresholds = Self::new();
        for (code, &limit) in codes {
            match DeviceCategory::from_code(code) {
                Some(category) => thresholds.set(category, limit),
                None => warn!("No device matches threshold code '{}'", code),
            }
        }
        thresholds
    }

    pub fn with(mut self, category: DeviceCategory, limit: f64) -> Self {
        self.set(category, limit);
        self
    }

    pub fn set(&mut self, category: DeviceCategory, limit: f64) {
        self.limits.insert(category, limit);
    }

    pub fn get(&self, category: DeviceCategory) -> Option<f64> {
        self.limits.get(&category).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

/// One device reading above its threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertLine {
    pub category: DeviceCategory,
    pub temperature: f64,
    pub threshold: f64,
}

impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "检测到 {} 温度异常，当前: {}°C, 阈值: {}°C",
            self.category.display_name(),
            format_celsius(self.temperature),
            format_celsius(self.threshold)
        )
    }
}

/// Readings strictly above their device's threshold, in reading order
///
/// Devices without a configured threshold are never evaluated.
pub fn evaluate(snapshot: &SensorSnapshot, thresholds: &ThresholdConfig) -> Vec<AlertLine> {
    snapshot
        .readings()
        .iter()
        .filter_map(|reading| {
            let threshold = thresholds.get(reading.category)?;
            (reading.temperature > threshold).then_some(AlertLine {
                category: reading.category,
                temperature: reading.temperature,
                threshold,
            })
        })
        .collect()
}

/// Combine alert lines into one message under the alert banner
///
/// Returns `None` when there is nothing to report.
pub fn compose_alert(lines: &[AlertLine]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }

    let mut message = String::from(ALERT_BANNER);
    for line in lines {
        message.push('\n');
        message.push_str(&line.to_string());
    }
    Some(message)
}
