use crate::error::CollectorError;
use log::debug;
use std::future::Future;
use std::pin::Pin;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Point-in-time CPU and memory usage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSnapshot {
    /// Global CPU usage, 0-100
    pub cpu_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
}

impl SystemSnapshot {
    /// Memory usage as a percentage of total, 0 when total is unknown
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total_bytes == 0 {
            return 0.0;
        }
        self.memory_used_bytes as f64 / self.memory_total_bytes as f64 * 100.0
    }

    pub fn memory_used_gb(&self) -> f64 {
        self.memory_used_bytes as f64 / BYTES_PER_GB
    }

    pub fn memory_total_gb(&self) -> f64 {
        self.memory_total_bytes as f64 / BYTES_PER_GB
    }
}

/// Source of CPU and memory usage for status reports
pub trait SystemProbe: Send + Sync {
    fn snapshot<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<SystemSnapshot, CollectorError>> + Send + 'a>>;
}

/// Probe backed by `sysinfo`
///
/// CPU usage needs two refreshes separated by a short delay, so each
/// snapshot runs on a blocking thread for roughly one second.
#[derive(Debug, Default)]
pub struct SysinfoProbe;

impl SysinfoProbe {
    fn measure() -> SystemSnapshot {
        let mut system = System::new();
        system.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL.max(std::time::Duration::from_secs(1)));
        system.refresh_cpu_usage();
        system.refresh_memory();

        let snapshot = SystemSnapshot {
            cpu_percent: system.global_cpu_usage() as f64,
            memory_used_bytes: system.used_memory(),
            memory_total_bytes: system.total_memory(),
        };
        debug!("System snapshot: {:?}", snapshot);
        snapshot
    }
}

impl SystemProbe for SysinfoProbe {
    fn snapshot<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<SystemSnapshot, CollectorError>> + Send + 'a>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(Self::measure)
                .await
                .map_err(|e| CollectorError::ProbeFailed(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_figures() {
        let snapshot = SystemSnapshot {
            cpu_percent: 12.5,
            memory_used_bytes: 4 * 1024 * 1024 * 1024,
            memory_total_bytes: 16 * 1024 * 1024 * 1024,
        };
        assert_eq!(snapshot.memory_percent(), 25.0);
        assert_eq!(snapshot.memory_used_gb(), 4.0);
        assert_eq!(snapshot.memory_total_gb(), 16.0);
    }

    #[test]
    fn test_memory_percent_with_unknown_total() {
        let snapshot = SystemSnapshot {
            cpu_percent: 0.0,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
        };
        assert_eq!(snapshot.memory_percent(), 0.0);
    }

    #[tokio::test]
    async fn test_sysinfo_probe_reports_sane_values() {
        let snapshot = SysinfoProbe.snapshot().await.unwrap();
        assert!(snapshot.cpu_percent >= 0.0);
        assert!(snapshot.memory_used_bytes <= snapshot.memory_total_bytes);
    }
}
