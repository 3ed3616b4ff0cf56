//! Periodic temperature monitoring
//!
//! A `Monitor` owns the sensor reader, the per-device history, the alert
//! thresholds and the dispatcher. Once spawned it wakes every check interval,
//! samples the sensors, records the readings and alerts the configured
//! targets when a device runs hotter than its threshold.
//!
//! Each tick runs in its own task. An error or panic inside a tick puts the
//! monitor into a recovery cooldown instead of ending the loop; only
//! cancellation stops it.

use crate::alerts::{
    compose_alert, evaluate, notifier, AlertDispatcher, DispatchReport, Notifier, ThresholdConfig,
};
use crate::collectors::{SensorReader, SysinfoProbe, SystemProbe};
use crate::config::Config;
use crate::error::{ConfigError, MonitorError};
use crate::history::HistoryStore;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pause after a failed tick before monitoring resumes
pub const CRASH_COOLDOWN: Duration = Duration::from_secs(300);

/// Lifecycle of the background monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Created but not spawned, or monitoring disabled
    Idle,
    Running,
    /// Waiting out `CRASH_COOLDOWN` after a failed tick
    CrashedRecovering,
    Cancelled,
}

/// Result of one scheduled check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The sensors reported nothing usable; history is unchanged
    NoData,
    /// Readings were recorded and every device is within its threshold
    Recorded,
    /// Readings were recorded and an alert was dispatched
    Alerted(DispatchReport),
    /// Cancellation was observed before the readings were recorded
    Cancelled,
}

/// Runtime settings derived from the configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub check_interval: Duration,
    /// Samples kept per device
    pub history_capacity: usize,
    pub thresholds: ThresholdConfig,
    pub alert_groups: Vec<String>,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enabled,
            check_interval: config.check_interval(),
            history_capacity: config.history_capacity(),
            thresholds: ThresholdConfig::from_codes(&config.thresholds),
            alert_groups: config.alert_groups.clone(),
        }
    }
}

/// Server temperature monitor
pub struct Monitor {
    pub(super) settings: MonitorSettings,
    pub(super) reader: SensorReader,
    pub(super) history: HistoryStore,
    pub(super) probe: Arc<dyn SystemProbe>,
    dispatcher: AlertDispatcher,
    state: Mutex<MonitorState>,
}

impl Monitor {
    /// Create a monitor from explicit parts
    ///
    /// The system probe defaults to `SysinfoProbe`; see `with_system_probe`.
    pub fn new(
        settings: MonitorSettings,
        reader: SensorReader,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let history = HistoryStore::new(settings.history_capacity);
        let dispatcher = AlertDispatcher::new(notifier, settings.alert_groups.clone());

        Self {
            settings,
            reader,
            history,
            probe: Arc::new(SysinfoProbe),
            dispatcher,
            state: Mutex::new(MonitorState::Idle),
        }
    }

    /// Create a monitor wired up from the configuration file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the notifier backend cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let settings = MonitorSettings::from_config(config);
        let reader = SensorReader::from_config(&config.sensors);
        let notifier = notifier::from_config(&config.notifier)?;

        info!(
            "Monitor configured: interval={:?}, history_capacity={}, alert_groups={}",
            settings.check_interval,
            settings.history_capacity,
            settings.alert_groups.len()
        );

        Ok(Self::new(settings, reader, notifier))
    }

    pub fn with_system_probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Run one check: sample, record, evaluate, alert
    ///
    /// # Errors
    ///
    /// Returns `MonitorError` if the history cannot be updated. Sensor and
    /// delivery failures are logged and never fail the tick.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<TickOutcome, MonitorError> {
        info!("Running scheduled temperature check");

        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(TickOutcome::Cancelled),
            snapshot = self.reader.sample() => snapshot,
        };

        if snapshot.is_empty() {
            warn!("Scheduled check got no temperature data, skipping this cycle");
            return Ok(TickOutcome::NoData);
        }

        if cancel.is_cancelled() {
            return Ok(TickOutcome::Cancelled);
        }

        self.history.record_snapshot(&snapshot)?;

        let lines = evaluate(&snapshot, &self.settings.thresholds);
        match compose_alert(&lines) {
            None => Ok(TickOutcome::Recorded),
            Some(message) => {
                warn!("{} device(s) above threshold", lines.len());
                let report = self.dispatcher.dispatch(&message).await;
                Ok(TickOutcome::Alerted(report))
            }
        }
    }

    /// Spawn the background loop if monitoring is enabled
    ///
    /// Returns `None` and stays `Idle` when disabled.
    pub fn start(self: &Arc<Self>) -> Option<MonitorHandle> {
        if !self.settings.enabled {
            info!("Temperature monitoring is disabled");
            return None;
        }
        Some(self.spawn())
    }

    /// Spawn the background loop unconditionally
    pub fn spawn(self: &Arc<Self>) -> MonitorHandle {
        let cancel = CancellationToken::new();
        self.set_state(MonitorState::Running);
        let task = tokio::spawn(Arc::clone(self).run(cancel.clone()));
        info!("Temperature monitor started");
        MonitorHandle { cancel, task }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        debug!("Monitor loop running every {:?}", self.settings.check_interval);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.check_interval) => {}
            }

            let monitor = Arc::clone(&self);
            let tick_cancel = cancel.clone();
            let result = tokio::spawn(async move { monitor.tick(&tick_cancel).await }).await;

            let failure = match result {
                Ok(Ok(TickOutcome::Cancelled)) => break,
                Ok(Ok(outcome)) => {
                    debug!("Tick finished: {:?}", outcome);
                    None
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("tick task aborted: {}", e)),
            };

            if let Some(reason) = failure {
                error!(
                    "Temperature monitor tick failed: {}. Resuming in {:?}",
                    reason, CRASH_COOLDOWN
                );
                self.set_state(MonitorState::CrashedRecovering);

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(CRASH_COOLDOWN) => {}
                }

                self.set_state(MonitorState::Running);
                info!("Temperature monitor resumed");
            }
        }

        self.set_state(MonitorState::Cancelled);
        info!("Temperature monitor stopped");
    }
}

/// Handle to a spawned monitor loop
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Token that stops the loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("Temperature monitor task ended abnormally: {}", e);
        }
    }
}
