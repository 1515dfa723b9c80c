// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! meterfocus CLI - HCS metering to FOCUS from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List regions
//! meterfocus regions
//!
//! # List tenants (level-1 VDCs)
//! meterfocus vdcs --level 1
//!
//! # Raw metering records for one day
//! meterfocus metrics --region lagos-mtn-1 --domain-id <id> \
//!     --start "2025-04-01 00:00:00" --end "2025-04-02 00:00:00"
//!
//! # FOCUS rows as pretty JSON
//! meterfocus transform --region lagos-mtn-1 --domain-id <id> \
//!     --start "2025-04-01 00:00:00" --end "2025-04-02 00:00:00" \
//!     --tenant-id <id> --tenant-name Acme --format json --pretty
//!
//! # Effective configuration
//! meterfocus config show
//! ```

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use meterfocus_fetch::FetchError;
use meterfocus_transform::TransformError;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{metrics, regions, transform, vdcs};
use config::{AppConfig, LogFormat};

/// Crates whose log output the verbosity flags control.
const LOG_TARGETS: &[&str] = &[
    "meterfocus",
    "meterfocus_core",
    "meterfocus_fetch",
    "meterfocus_transform",
];

// ============================================================================
// CLI Definition
// ============================================================================

/// meterfocus CLI - HCS metering to FOCUS.
#[derive(Parser)]
#[command(name = "meterfocus")]
#[command(about = "Fetch HCS ManageOne metering data and normalise it into FOCUS rows")]
#[command(long_about = r#"
meterfocus talks to the HCS ManageOne SC northbound API: it authenticates
against IAM, pages through regions, VDCs and metering records, and maps
metering records into FOCUS cost/usage rows.

Configuration is read from <config_dir>/meterfocus/config.json and the
IAM_DOMAIN, IAM_USERNAME, IAM_PASSWORD, IAM_AUTH_DOMAIN, SC_DOMAIN,
SC_API_TIMEOUT, BILLING_CURRENCY, LOG_LEVEL and LOG_FORMAT variables.

Examples:
  meterfocus regions                      # Region catalog
  meterfocus vdcs --level 1               # Tenants
  meterfocus transform ... --format json  # FOCUS rows
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (defaults to the per-user config path).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List regions.
    #[command(visible_alias = "r")]
    Regions,

    /// List VDCs (tenant hierarchy).
    #[command(visible_alias = "v")]
    Vdcs(vdcs::VdcsArgs),

    /// Fetch raw metering records.
    #[command(visible_alias = "m")]
    Metrics(metrics::MetricsArgs),

    /// Fetch metering records and map them into FOCUS rows.
    #[command(visible_alias = "t")]
    Transform(transform::TransformArgs),

    /// Manage configuration.
    Config(commands::config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Credentials or token rejected.
    AuthFailed = 2,
    /// Upstream unreachable or returned garbage.
    Upstream = 3,
    /// Timeout.
    Timeout = 4,
    /// Bad input or a record that could not be mapped.
    InvalidData = 5,
    /// Interrupted.
    Cancelled = 130,
}

impl ExitCode {
    /// Exit code for a boundary status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthFailed,
            502 => Self::Upstream,
            504 => Self::Timeout,
            400 | 422 => Self::InvalidData,
            499 => Self::Cancelled,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn log_filter(verbose: bool, level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if verbose { "debug" } else { level };
    let directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    EnvFilter::try_new(directives.join(","))
        .unwrap_or_else(|_| EnvFilter::new("meterfocus=warn"))
}

fn setup_logging(verbose: bool, quiet: bool, config: &AppConfig) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = log_filter(verbose, &config.log_level);
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

// ============================================================================
// Error Reporting
// ============================================================================

/// Status code and error body for a failed command.
fn describe_error(err: &anyhow::Error, request_id: &str) -> (u16, serde_json::Value) {
    if let Some(e) = err.downcast_ref::<TransformError>() {
        return (e.status_code(), e.to_error_body(request_id));
    }
    if let Some(e) = err.downcast_ref::<FetchError>() {
        return (e.status_code(), e.to_error_body(request_id));
    }
    let body = meterfocus_core::error_body(
        "INTERNAL_ERROR",
        &format!("{err:#}"),
        None,
        request_id,
    );
    (500, body)
}

fn report_error(err: &anyhow::Error, cli: &Cli) -> ExitCode {
    let request_id = uuid::Uuid::new_v4().to_string();
    let (status, body) = describe_error(err, &request_id);

    if !cli.quiet {
        match cli.format {
            OutputFormat::Json => {
                let formatter = output::JsonFormatter::new(cli.pretty);
                match formatter.format(&body) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("Error: {err:#}"),
                }
            }
            OutputFormat::Text => eprintln!("Error: {err:#} (request {request_id})"),
        }
    }

    ExitCode::from_status(status)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::Error as i32);
        }
    };

    setup_logging(cli.verbose, cli.quiet, &config);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            interrupt.cancel();
        }
    });

    let result = match &cli.command {
        Commands::Regions => regions::run(&cli, &config, &cancel).await,
        Commands::Vdcs(args) => vdcs::run(args, &cli, &config, &cancel).await,
        Commands::Metrics(args) => metrics::run(args, &cli, &config, &cancel).await,
        Commands::Transform(args) => transform::run(args, &cli, &config, &cancel).await,
        Commands::Config(args) => commands::config::run(args, &cli, &config_path, &config),
    };

    if let Err(e) = result {
        let code = report_error(&e, &cli);
        std::process::exit(code as i32);
    }

    Ok(())
}
