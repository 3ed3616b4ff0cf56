use crate::alerts::Notifier;
use log::{error, info, warn};
use std::sync::Arc;

/// Outcome of delivering one alert to every target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fans an alert message out to the configured notification targets
///
/// A failing target is logged and skipped; the remaining targets are still
/// attempted.
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    targets: Vec<String>,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, targets: Vec<String>) -> Self {
        Self { notifier, targets }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Send `message` to every target in configuration order
    pub async fn dispatch(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        if self.targets.is_empty() {
            warn!("Temperature threshold exceeded but no alert_groups are configured");
            return report;
        }

        for target in &self.targets {
            info!("Sending high temperature alert to {}", target);
            match self.notifier.send(target, message).await {
                Ok(()) => report.delivered.push(target.clone()),
                Err(e) => {
                    error!("Failed to deliver alert to {}: {}", target, e);
                    report.failed.push(target.clone());
                }
            }
        }

        report
    }
}
