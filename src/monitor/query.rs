//! Interactive temperature and status reports
//!
//! Every reading shown in a report is appended to the device history first,
//! so the trend arrow reflects the value being displayed.

use crate::error::MonitorError;
use crate::events::{format_celsius, SensorSnapshot};
use crate::monitor::Monitor;
use log::{error, info};

pub const TEMPERATURE_HEADER: &str = "--- 温度信息 ---";
pub const TEMPERATURE_UNAVAILABLE_HEADER: &str = "--- 温度信息 (无法获取) ---";
pub const TEMPERATURE_UNAVAILABLE: &str = "无法获取服务器温度信息，请检查后台日志。";
pub const SYSTEM_HEADER: &str = "--- 系统状态 ---";
pub const SYSTEM_UNAVAILABLE_HEADER: &str = "--- 系统状态 (无法获取) ---";
pub const SYSTEM_UNAVAILABLE: &str = "获取服务器CPU/内存状态失败，请检查后台日志。";

impl Monitor {
    /// Current temperature per device with its trend arrow
    pub async fn temperature_report(&self) -> String {
        info!("Temperature query received");

        let snapshot = self.reader.sample().await;
        if snapshot.is_empty() {
            return TEMPERATURE_UNAVAILABLE.to_string();
        }

        match self.temperature_lines(&snapshot) {
            Ok(lines) => format!("{}\n{}", TEMPERATURE_HEADER, lines.join("\n")),
            Err(e) => {
                error!("Failed to update temperature history: {}", e);
                TEMPERATURE_UNAVAILABLE.to_string()
            }
        }
    }

    /// Temperature block followed by CPU and memory usage
    pub async fn status_report(&self) -> String {
        info!("Status query received");

        let mut parts = Vec::new();

        let snapshot = self.reader.sample().await;
        let lines = if snapshot.is_empty() {
            None
        } else {
            self.temperature_lines(&snapshot)
                .map_err(|e| error!("Failed to update temperature history: {}", e))
                .ok()
        };
        match lines {
            Some(lines) => {
                parts.push(TEMPERATURE_HEADER.to_string());
                parts.extend(lines);
            }
            None => parts.push(TEMPERATURE_UNAVAILABLE_HEADER.to_string()),
        }

        parts.push(String::new());
        match self.probe.snapshot().await {
            Ok(system) => {
                parts.push(SYSTEM_HEADER.to_string());
                parts.push(format!("CPU使用率: {}%", round2(system.cpu_percent)));
                parts.push(format!(
                    "内存使用率: {}% ({}GB/{}GB)",
                    round2(system.memory_percent()),
                    round2(system.memory_used_gb()),
                    round2(system.memory_total_gb())
                ));
            }
            Err(e) => {
                error!("Failed to read CPU/memory usage: {}", e);
                parts.push(SYSTEM_UNAVAILABLE_HEADER.to_string());
                parts.push(SYSTEM_UNAVAILABLE.to_string());
            }
        }

        parts.join("\n")
    }

    /// `{name}温度: {value}°C {arrow}` for each reading, in reading order
    fn temperature_lines(&self, snapshot: &SensorSnapshot) -> Result<Vec<String>, MonitorError> {
        snapshot
            .readings()
            .iter()
            .map(|reading| -> Result<String, MonitorError> {
                let trend = self
                    .history
                    .append_and_trend(reading.category, reading.temperature)?;
                let line = format!(
                    "{}温度: {}°C {}",
                    reading.category.display_name(),
                    format_celsius(reading.temperature),
                    trend.symbol()
                );
                Ok(line.trim_end().to_string())
            })
            .collect()
    }
}

/// Round to two decimals for display
fn round2(value: f64) -> String {
    format_celsius((value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{LogNotifier, ThresholdConfig};
    use crate::collectors::{SensorReader, SensorSource, SystemProbe, SystemSnapshot};
    use crate::error::CollectorError;
    use crate::events::DeviceCategory;
    use crate::monitor::MonitorSettings;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Returns queued outputs in order, then an empty string
    struct QueuedSource(Mutex<Vec<String>>);

    impl QueuedSource {
        fn new(mut outputs: Vec<String>) -> Self {
            outputs.reverse();
            Self(Mutex::new(outputs))
        }
    }

    impl SensorSource for QueuedSource {
        fn read_raw<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<String, CollectorError>> + Send + 'a>> {
            let output = self.0.lock().unwrap().pop().unwrap_or_default();
            Box::pin(async move { Ok(output) })
        }
    }

    struct FixedProbe(Option<SystemSnapshot>);

    impl SystemProbe for FixedProbe {
        fn snapshot<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<SystemSnapshot, CollectorError>> + Send + 'a>>
        {
            let result = self
                .0
                .ok_or_else(|| CollectorError::ProbeFailed("probe offline".to_string()));
            Box::pin(async move { result })
        }
    }

    const GIB: u64 = 1024 * 1024 * 1024;

    fn monitor(outputs: Vec<String>, probe: Option<SystemSnapshot>) -> Monitor {
        let settings = MonitorSettings {
            enabled: false,
            check_interval: Duration::from_secs(300),
            history_capacity: 7,
            thresholds: ThresholdConfig::new(),
            alert_groups: Vec::new(),
        };
        Monitor::new(
            settings,
            SensorReader::new(Arc::new(QueuedSource::new(outputs))),
            Arc::new(LogNotifier),
        )
        .with_system_probe(Arc::new(FixedProbe(probe)))
    }

    fn cpu(value: &str) -> String {
        format!("coretemp-isa-0000\nPackage id 0:  +{}°C\n", value)
    }

    #[tokio::test]
    async fn test_report_without_data() {
        let monitor = monitor(Vec::new(), None);
        assert_eq!(monitor.temperature_report().await, TEMPERATURE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_report_shows_trend() {
        let monitor = monitor(vec![cpu("40.0"), cpu("40.5"), cpu("41.2")], None);

        assert_eq!(
            monitor.temperature_report().await,
            "--- 温度信息 ---\nCPU温度: 40.0°C"
        );
        assert_eq!(
            monitor.temperature_report().await,
            "--- 温度信息 ---\nCPU温度: 40.5°C ↑"
        );
        assert_eq!(
            monitor.temperature_report().await,
            "--- 温度信息 ---\nCPU温度: 41.2°C ↑"
        );
        assert_eq!(monitor.history().get(DeviceCategory::Cpu).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_report_falling_and_all_devices() {
        let sample = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/sensors.txt"));
        let monitor = monitor(vec![cpu("60.0"), sample.to_string()], None);

        monitor.temperature_report().await;
        let report = monitor.temperature_report().await;

        assert_eq!(
            report,
            "--- 温度信息 ---\n\
             网卡温度: 39.0°C\n\
             主板温度: 27.8°C\n\
             CPU温度: 45.0°C ↓\n\
             硬盘温度: 38.9°C"
        );
    }

    #[tokio::test]
    async fn test_status_report() {
        let system = SystemSnapshot {
            cpu_percent: 12.346,
            memory_used_bytes: 4 * GIB,
            memory_total_bytes: 16 * GIB,
        };
        let monitor = monitor(vec![cpu("45.0")], Some(system));

        assert_eq!(
            monitor.status_report().await,
            "--- 温度信息 ---\n\
             CPU温度: 45.0°C\n\
             \n\
             --- 系统状态 ---\n\
             CPU使用率: 12.35%\n\
             内存使用率: 25.0% (4.0GB/16.0GB)"
        );
    }

    #[tokio::test]
    async fn test_status_report_with_nothing_available() {
        let monitor = monitor(Vec::new(), None);

        assert_eq!(
            monitor.status_report().await,
            "--- 温度信息 (无法获取) ---\n\
             \n\
             --- 系统状态 (无法获取) ---\n\
             获取服务器CPU/内存状态失败，请检查后台日志。"
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), "12.35");
        assert_eq!(round2(25.0), "25.0");
        assert_eq!(round2(3.999), "4.0");
    }
}
