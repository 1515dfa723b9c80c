//! VDCs command - list the tenant hierarchy.

use anyhow::Result;
use clap::Args;
use meterfocus_core::VdcQuery;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the vdcs command.
#[derive(Args, Debug, Clone)]
pub struct VdcsArgs {
    /// VDC level (1 = tenant, up to 5).
    #[arg(long)]
    pub level: Option<u8>,

    /// Only tenants (`true`) or only non-tenants (`false`).
    #[arg(long)]
    pub tenants: Option<bool>,

    /// Filter by name.
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by tenant domain ID.
    #[arg(long)]
    pub domain_id: Option<String>,

    /// Page size (1-1000).
    #[arg(long, default_value = "1000")]
    pub limit: u32,
}

impl VdcsArgs {
    /// Converts the arguments into a query.
    pub fn to_query(&self) -> VdcQuery {
        VdcQuery {
            limit: self.limit,
            level: self.level,
            is_domain: self.tenants,
            name: self.name.clone(),
            domain_id: self.domain_id.clone(),
        }
    }
}

/// Runs the vdcs command.
pub async fn run(
    args: &VdcsArgs,
    cli: &Cli,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = config.source_client()?;
    let mut session = client.new_session();

    let vdcs = client
        .fetch_vdcs_with_cancel(&mut session, &args.to_query(), cancel)
        .await?;
    info!(count = vdcs.len(), "Fetched VDCs");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_vdcs(&vdcs));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&vdcs)?);
        }
    }

    Ok(())
}
