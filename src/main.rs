use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use servertemp::collectors::SensorReader;
use servertemp::config::Config;
use servertemp::error::ConfigError;
use servertemp::monitor::Monitor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Command-line arguments for the server temperature monitor
#[derive(Parser)]
#[command(
    name = "servertemp",
    about = "Server hardware temperature monitor with threshold alerts",
    long_about = "Reads CPU, motherboard, wireless and NVMe temperatures from lm-sensors, \
                  tracks short-term trends, and alerts configured targets when a device \
                  runs hotter than its threshold."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run the background monitor and accept console commands (default)
    Run,
    /// Print current temperatures once
    Temp {
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print temperatures with CPU and memory usage once
    Status,
}

impl Cli {
    /// Reject a config path that exists but is not a regular file
    ///
    /// A missing file is accepted; `load_config` falls back to defaults.
    fn validate(&self) -> Result<(), String> {
        let Some(path) = self.config.as_deref() else {
            return Ok(());
        };

        if path.exists() && !path.is_file() {
            return Err(format!("Configuration path is not a file: {}", path.display()));
        }
        if path.extension().is_some_and(|ext| ext != "toml") {
            warn!("Configuration file is not a .toml file: {}", path.display());
        }

        Ok(())
    }
}

/// Configuration from `path`, or the defaults when no usable file is given
///
/// Unreadable and invalid files are logged; the monitor always starts.
fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Config::default();
    };

    info!("Loading configuration from {}", path.display());
    Config::from_file(path).unwrap_or_else(|e| {
        match e {
            ConfigError::ReadError(_) => warn!("{}; using defaults", e),
            _ => error!("Invalid configuration in {}: {}; using defaults", path.display(), e),
        }
        Config::default()
    })
}

const CONSOLE_HELP: &str = "Commands: servertemp | 温度 | temp, status | 状态, help, quit";

/// A line typed on the interactive console
#[derive(Debug, PartialEq, Eq)]
enum ConsoleCommand {
    Temperature,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one console line; blank lines yield `None`
    ///
    /// A leading `/` is accepted so chat-style commands work as typed.
    fn parse(line: &str) -> Option<Self> {
        let word = line.trim();
        let word = word.strip_prefix('/').unwrap_or(word);
        if word.is_empty() {
            return None;
        }

        Some(match word {
            "servertemp" | "温度" | "temp" => ConsoleCommand::Temperature,
            "status" | "状态" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => ConsoleCommand::Unknown(other.to_string()),
        })
    }
}

/// Start the background monitor and serve console commands until stopped
async fn run(config: &Config) -> anyhow::Result<()> {
    let monitor = Arc::new(Monitor::from_config(config).context("Failed to build monitor")?);
    let handle = monitor.start();

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        ctrlc_token.cancel();
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Server temperature monitor is running. Press Ctrl+C to stop.");
    println!("{}", CONSOLE_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read console input")?,
        };

        let Some(line) = line else {
            // stdin closed; keep monitoring until interrupted
            if handle.is_some() {
                info!("Console input closed, monitoring continues until Ctrl+C");
                shutdown.cancelled().await;
            }
            break;
        };

        match ConsoleCommand::parse(&line) {
            None => {}
            Some(ConsoleCommand::Temperature) => println!("{}", monitor.temperature_report().await),
            Some(ConsoleCommand::Status) => println!("{}", monitor.status_report().await),
            Some(ConsoleCommand::Help) => println!("{}", CONSOLE_HELP),
            Some(ConsoleCommand::Quit) => break,
            Some(ConsoleCommand::Unknown(word)) => {
                println!("Unknown command '{}'. {}", word, CONSOLE_HELP)
            }
        }
    }

    if let Some(handle) = handle {
        handle.shutdown().await;
    }

    info!("Server temperature monitor shutdown complete");
    Ok(())
}

async fn execute(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Run => run(&config).await,
        Command::Temp { json: true } => {
            let snapshot = SensorReader::from_config(&config.sensors)
                .try_sample()
                .await
                .context("Failed to read sensors")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::Temp { json: false } => {
            let monitor = Monitor::from_config(&config).context("Failed to build monitor")?;
            println!("{}", monitor.temperature_report().await);
            Ok(())
        }
        Command::Status => {
            let monitor = Monitor::from_config(&config).context("Failed to build monitor")?;
            println!("{}", monitor.status_report().await);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config = load_config(cli.config.as_deref());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let command = cli.command.clone().unwrap_or(Command::Run);
    let result = runtime.block_on(execute(command, config));

    // The blocking stdin reader cannot be interrupted; do not wait for it
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
