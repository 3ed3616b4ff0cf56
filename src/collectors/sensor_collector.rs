use crate::config::SensorsConfig;
use crate::error::CollectorError;
use crate::events::{DeviceCategory, SensorSnapshot};
use log::{debug, error, info, warn};
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Source of raw `sensors`-formatted text
pub trait SensorSource: Send + Sync {
    fn read_raw<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, CollectorError>> + Send + 'a>>;
}

/// Runs the lm-sensors `sensors` utility as a subprocess
///
/// The child is bounded by a timeout and killed if it does not finish in
/// time, so a hung sensor driver cannot stall the monitor loop.
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSource {
    /// Create a source that runs `program args...`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use servertemp::collectors::CommandSource;
    ///
    /// let source = CommandSource::new("sensors", Vec::new(), Duration::from_secs(30));
    /// ```
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    async fn run(&self) -> Result<String, CollectorError> {
        debug!("Running sensor utility: {} {:?}", self.program, self.args);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CollectorError::Timeout(self.timeout))?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CollectorError::NotFound(self.program.clone()),
                _ => CollectorError::SubprocessSpawn(format!("{}: {}", self.program, e)),
            })?;

        if !output.status.success() {
            return Err(CollectorError::ExecutionFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SensorSource for CommandSource {
    fn read_raw<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, CollectorError>> + Send + 'a>> {
        Box::pin(self.run())
    }
}

/// Replays captured `sensors` output from a file on every read
///
/// Useful on hosts without lm-sensors and for demonstrations.
pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SensorSource for ReplaySource {
    fn read_raw<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, CollectorError>> + Send + 'a>> {
        Box::pin(async move { Ok(tokio::fs::read_to_string(&self.path).await?) })
    }
}

/// Reads hardware temperatures and normalizes them per device category
#[derive(Clone)]
pub struct SensorReader {
    source: Arc<dyn SensorSource>,
}

impl SensorReader {
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self { source }
    }

    /// Build a reader from the `[sensors]` configuration section
    pub fn from_config(config: &SensorsConfig) -> Self {
        let source: Arc<dyn SensorSource> = match &config.replay_file {
            Some(path) => {
                info!("Replaying sensor output from {}", path.display());
                Arc::new(ReplaySource::new(path.clone()))
            }
            None => Arc::new(CommandSource::new(
                config.command.clone(),
                config.args.clone(),
                Duration::from_secs(config.timeout_seconds),
            )),
        };
        Self::new(source)
    }

    /// Sample all recognised sensors
    ///
    /// # Errors
    ///
    /// Returns `CollectorError` when the utility is missing, times out, or
    /// exits with a non-zero status. Individual malformed value lines are
    /// skipped and never fail the pass.
    pub async fn try_sample(&self) -> Result<SensorSnapshot, CollectorError> {
        let output = self.source.read_raw().await?;
        Ok(parse_sensors_output(&output))
    }

    /// Sample all recognised sensors, treating any failure as "no data"
    pub async fn sample(&self) -> SensorSnapshot {
        match self.try_sample().await {
            Ok(snapshot) => snapshot,
            Err(CollectorError::NotFound(program)) => {
                error!(
                    "Sensor utility '{}' not found. Install lm-sensors on this host.",
                    program
                );
                SensorSnapshot::new()
            }
            Err(e) => {
                error!("Failed to read sensor data: {}", e);
                SensorSnapshot::new()
            }
        }
    }
}

/// Scan `sensors` output for one representative temperature per device
///
/// A chip header line (`coretemp-isa-0000`, `nvme-pci-0100`, ...) opens the
/// device's section. The first key line inside that section that parses
/// yields the reading and closes the section, so later key lines in the same
/// block are ignored.
pub fn parse_sensors_output(output: &str) -> SensorSnapshot {
    let mut snapshot = SensorSnapshot::new();
    let mut section: Option<DeviceCategory> = None;

    for line in output.lines() {
        let line = line.trim();

        if let Some(category) = DeviceCategory::from_section_header(line) {
            section = Some(category);
        }

        let Some(category) = section else {
            continue;
        };

        let Some(raw) = extract_key_value(line, category.key_label()) else {
            continue;
        };

        match parse_temperature(raw) {
            Ok(temperature) => {
                debug!("{} temperature: {}", category.code(), temperature);
                snapshot.insert(category, temperature);
                section = None;
            }
            Err(e) => {
                warn!("Skipping {} line '{}': {}", category.code(), line, e);
            }
        }
    }

    snapshot
}

/// First token after the label's colon, e.g. `+45.0°C` from
/// `Package id 0:  +45.0°C  (high = +80.0°C, crit = +100.0°C)`
fn extract_key_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    if !line.contains(label) {
        return None;
    }
    let token = line.split(':').nth(1)?.trim().split(' ').next()?;
    (!token.is_empty()).then_some(token)
}

/// Parse a value such as `+45.0°C` into degrees Celsius
pub fn parse_temperature(raw: &str) -> Result<f64, CollectorError> {
    let cleaned = raw.trim_start_matches('+').replace("°C", "");
    let value: f64 = cleaned
        .parse()
        .map_err(|e| CollectorError::ParseError(format!("'{}': {}", raw, e)))?;

    if !value.is_finite() {
        return Err(CollectorError::ParseError(format!(
            "'{}' is not a finite temperature",
            raw
        )));
    }

    Ok(value)
}
