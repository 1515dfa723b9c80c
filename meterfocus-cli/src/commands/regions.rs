//! Regions command - list the region catalog.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the regions command.
pub async fn run(cli: &Cli, config: &AppConfig, cancel: &CancellationToken) -> Result<()> {
    let client = config.source_client()?;
    let mut session = client.new_session();

    let regions = client
        .fetch_regions_with_cancel(&mut session, cancel)
        .await?;
    info!(count = regions.len(), "Fetched regions");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_regions(&regions));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&regions)?);
        }
    }

    Ok(())
}
