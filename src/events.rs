//! Core reading types for the server temperature monitor
//!
//! This module defines the device categories recognised in `sensors` output,
//! a single temperature reading, and the snapshot produced by one sampling pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Physical sensor domain reported by lm-sensors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceCategory {
    /// CPU package aggregate sensor (`coretemp`)
    #[serde(rename = "CPU")]
    Cpu,
    /// Board / ACPI thermal zone
    Motherboard,
    /// Wireless NIC (`iwlwifi`)
    #[serde(rename = "WIFI")]
    Wifi,
    /// NVMe composite sensor
    #[serde(rename = "NVMe")]
    Nvme,
}

impl DeviceCategory {
    /// Every category, in section-header match order
    pub const ALL: [DeviceCategory; 4] = [
        DeviceCategory::Cpu,
        DeviceCategory::Motherboard,
        DeviceCategory::Wifi,
        DeviceCategory::Nvme,
    ];

    /// Code used for this category in configuration files
    pub fn code(self) -> &'static str {
        match self {
            DeviceCategory::Cpu => "CPU",
            DeviceCategory::Motherboard => "Motherboard",
            DeviceCategory::Wifi => "WIFI",
            DeviceCategory::Nvme => "NVMe",
        }
    }

    /// Look up a category by its configuration code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.code() == code)
    }

    /// Name shown to users in reports and alerts
    pub fn display_name(self) -> &'static str {
        match self {
            DeviceCategory::Cpu => "CPU",
            DeviceCategory::Motherboard => "主板",
            DeviceCategory::Wifi => "网卡",
            DeviceCategory::Nvme => "硬盘",
        }
    }

    /// Prefix of the chip header line that opens this device's block
    pub fn section_prefix(self) -> &'static str {
        match self {
            DeviceCategory::Cpu => "coretemp-isa",
            DeviceCategory::Motherboard => "acpitz-acpi",
            DeviceCategory::Wifi => "iwlwifi",
            DeviceCategory::Nvme => "nvme-pci",
        }
    }

    /// Label of the line carrying the representative temperature
    pub fn key_label(self) -> &'static str {
        match self {
            DeviceCategory::Cpu => "Package id 0:",
            DeviceCategory::Motherboard | DeviceCategory::Wifi => "temp1:",
            DeviceCategory::Nvme => "Composite:",
        }
    }

    /// Match a trimmed line against the known chip header prefixes
    pub fn from_section_header(line: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| line.starts_with(category.section_prefix()))
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One temperature reading for a device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DeviceReading {
    pub category: DeviceCategory,
    /// Degrees Celsius
    pub temperature: f64,
}

/// Readings gathered in one sampling pass
///
/// Keeps devices in the order they first appeared in the sensor output.
/// A category reported twice keeps its position and takes the later value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorSnapshot {
    /// When the pass completed
    pub timestamp: Timestamp,
    readings: Vec<DeviceReading>,
}

impl SensorSnapshot {
    /// Create an empty snapshot stamped with the current time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create an empty snapshot with an explicit timestamp
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            readings: Vec::new(),
        }
    }

    /// Insert or replace the reading for a category
    pub fn insert(&mut self, category: DeviceCategory, temperature: f64) {
        match self.readings.iter_mut().find(|r| r.category == category) {
            Some(existing) => existing.temperature = temperature,
            None => self.readings.push(DeviceReading {
                category,
                temperature,
            }),
        }
    }

    /// Temperature for a category, if it was reported in this pass
    pub fn get(&self, category: DeviceCategory) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.temperature)
    }

    pub fn readings(&self) -> &[DeviceReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// An empty snapshot means "no usable data" for this cycle
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(DeviceCategory, f64)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (DeviceCategory, f64)>>(iter: I) -> Self {
        let mut snapshot = SensorSnapshot::new();
        for (category, temperature) in iter {
            snapshot.insert(category, temperature);
        }
        snapshot
    }
}

/// Format a temperature for reports: `75.0`, `45.5`, `38.85`
///
/// Integral values keep one decimal place so readings line up with what
/// `sensors` prints.
pub fn format_celsius(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
