//! lincheck - Check recorded histories for linearizability.
//!
//! Loads a JSON history, checks it against one of the built-in models and
//! prints the verdict.
//!
//! # Usage
//!
//! ```bash
//! # Check a register history recorded as timestamped operations
//! lincheck history.json
//!
//! # Check a key/value event history with a deadline, printing witnesses
//! lincheck --model kv --format events --timeout-ms 5000 --verbose history.json
//!
//! # Start from a configuration file
//! lincheck --config lincheck.toml history.json
//! ```
//!
//! # Exit status
//!
//! `0` if the history is linearizable, `2` if it is not, `3` if the check
//! timed out or was interrupted, and `1` on any error.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::CliConfig;
use lincheck_checker::models::{KvModel, RegisterModel};
use lincheck_checker::{CheckResult, CheckStatus, LinearizabilityChecker, Model};
use lincheck_core::history::read_document;
use lincheck_core::{events_from_json, operations_from_json};
use serde::de::DeserializeOwned;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Built-in models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelKind {
    /// Single integer register with put and get.
    Register,
    /// String key/value store with get, put and append, checked per key.
    Kv,
}

/// Shape of the history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HistoryFormat {
    /// Operations with explicit call and return times.
    Operations,
    /// Call and return events paired by id, ordered by position.
    Events,
}

/// CLI arguments for lincheck.
#[derive(Parser, Debug)]
#[command(
    name = "lincheck",
    about = "Check a recorded concurrent history for linearizability",
    version
)]
pub struct CliArgs {
    /// JSON history to check ("-" reads standard input).
    #[arg(value_name = "HISTORY", required_unless_present = "print_config")]
    history: Option<PathBuf>,

    /// Model to check against.
    #[arg(short, long, value_enum, default_value_t = ModelKind::Register)]
    model: ModelKind,

    /// Shape of the history file.
    #[arg(short, long, value_enum, default_value_t = HistoryFormat::Operations)]
    format: HistoryFormat,

    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Give up after this many milliseconds.
    #[arg(short, long, value_name = "MS", conflicts_with = "no_timeout")]
    timeout_ms: Option<u64>,

    /// Search without a deadline, even if the configuration sets one.
    #[arg(long)]
    no_timeout: bool,

    /// Disable the visited-state cache.
    #[arg(long)]
    no_cache: bool,

    /// Print the linearization found, or the longest partial ones.
    #[arg(short, long)]
    verbose: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Print the default configuration and exit.
    #[arg(long)]
    print_config: bool,
}

/// Initialize tracing based on configuration.
fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    // Logs go to stderr so stdout carries only the report.
    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

fn read_history(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return read_document(std::io::stdin().lock()).context("Failed to read history from stdin");
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open history {:?}", path))?;
    read_document(file).with_context(|| format!("Failed to read history {:?}", path))
}

/// Parses the history for `model`, checks it and prints the outcome.
async fn run<M>(model: M, args: &CliArgs, config: &CliConfig, document: &str) -> Result<CheckStatus>
where
    M: Model + 'static,
    M::Input: DeserializeOwned + 'static,
    M::Output: DeserializeOwned + 'static,
    M::State: 'static,
{
    let checker = LinearizabilityChecker::with_config(model, config.checker.clone());

    let cancel = checker.cancel_handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning the check");
            cancel.cancel();
        }
    });

    let (result, witnesses) = match args.format {
        HistoryFormat::Operations => {
            let history = operations_from_json(document).context("Invalid operation history")?;
            info!(operations = history.len(), model = checker.model().name(), "Loaded history");
            if args.verbose {
                let (result, info) = checker.check_operations_verbose(history).await?;
                (result, Some(info.describe(checker.model())))
            } else {
                (checker.check_operations(history).await?, None)
            }
        }
        HistoryFormat::Events => {
            let history = events_from_json(document).context("Invalid event history")?;
            info!(events = history.len(), model = checker.model().name(), "Loaded history");
            if args.verbose {
                let (result, info) = checker.check_events_verbose(history).await?;
                (result, Some(info.describe(checker.model())))
            } else {
                (checker.check_events(history).await?, None)
            }
        }
    };

    if args.json {
        let report = serde_json::json!({
            "result": &result,
            "witnesses": &witnesses,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&result, witnesses.as_deref());
    }

    Ok(result.status)
}

fn print_report(result: &CheckResult, witnesses: Option<&[Vec<Vec<String>>]>) {
    println!("{}", result.status);
    println!("{}", result.stats);
    for partition in &result.partitions {
        println!(
            "  partition {}: {} ({} operations)",
            partition.index, partition.status, partition.operations
        );
        let Some(witnesses) = witnesses.and_then(|w| w.get(partition.index)) else {
            continue;
        };
        for (n, witness) in witnesses.iter().enumerate() {
            let label = if partition.status == CheckStatus::Ok {
                "linearization".to_string()
            } else {
                format!("partial #{}", n + 1)
            };
            println!("    {label}: {}", witness.join(", "));
        }
    }
}

fn exit_code(status: CheckStatus) -> ExitCode {
    match status {
        CheckStatus::Ok => ExitCode::SUCCESS,
        CheckStatus::Illegal => ExitCode::from(2),
        CheckStatus::Unknown => ExitCode::from(3),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

    if args.print_config {
        let config = CliConfig::default();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = if let Some(ref config_path) = args.config {
        CliConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        CliConfig::default()
    };

    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    let path = args
        .history
        .as_ref()
        .context("No history file given")?;
    let document = read_history(path)?;

    let status = match args.model {
        ModelKind::Register => run(RegisterModel, &args, &config, &document).await,
        ModelKind::Kv => run(KvModel, &args, &config, &document).await,
    };

    match status {
        Ok(status) => Ok(exit_code(status)),
        Err(e) => {
            error!(error = %e, "Check failed");
            Err(e)
        }
    }
}
