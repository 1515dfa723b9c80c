//! Config command - inspect configuration.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (password redacted).
    Show,

    /// Show the configuration file path.
    Path,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli, path: &Path, config: &AppConfig) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config),
        ConfigAction::Path => show_path(cli, path),
    }
}

fn show_config(cli: &Cli, config: &AppConfig) -> Result<()> {
    let config = config.redacted();

    match cli.format {
        OutputFormat::Text => {
            println!("meterfocus Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("IAM domain:       {}", display_or_unset(&config.iam_domain));
            println!("IAM username:     {}", display_or_unset(&config.iam_username));
            println!("IAM password:     {}", display_or_unset(&config.iam_password));
            println!("IAM auth domain:  {}", config.iam_auth_domain);
            println!("SC domain:        {}", display_or_unset(&config.sc_domain));
            println!("SC API timeout:   {}s", config.sc_api_timeout);
            println!("Billing currency: {}", config.billing_currency);
            println!("Invalid certs:    {}", config.accept_invalid_certs);
            println!("Log level:        {}", config.log_level);
            println!("Log format:       {}", config.log_format);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_path(cli: &Cli, path: &Path) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            println!("Config file: {}", path.display());
            if !path.exists() {
                println!("(not found; defaults and environment in use)");
            }
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_file": path.display().to_string(),
                "exists": path.exists(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}
