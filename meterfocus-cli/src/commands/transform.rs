//! Transform command - fetch metering records and emit FOCUS rows.

use anyhow::Result;
use clap::Args;
use meterfocus_core::AccountContext;
use meterfocus_transform::TransformService;
use tokio_util::sync::CancellationToken;

use super::metrics::MetricsArgs;
use crate::config::AppConfig;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the transform command.
#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// Metering query.
    #[command(flatten)]
    pub query: MetricsArgs,

    /// Tenant name (BillingAccountName).
    #[arg(long, default_value = "")]
    pub tenant_name: String,

    /// Tenant ID (BillingAccountId).
    #[arg(long, default_value = "")]
    pub tenant_id: String,

    /// VDC name (SubAccountName).
    #[arg(long, default_value = "")]
    pub vdc_name: String,

    /// VDC ID (SubAccountId fallback).
    #[arg(long, default_value = "")]
    pub vdc_id: String,
}

impl TransformArgs {
    /// Account context stamped onto every row.
    pub fn context(&self) -> AccountContext {
        AccountContext::new(&self.tenant_name, &self.tenant_id, &self.vdc_name, &self.vdc_id)
    }
}

/// Runs the transform command.
pub async fn run(
    args: &TransformArgs,
    cli: &Cli,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let service = TransformService::with_settings(config.source_client()?, config.mapper_settings());
    let mut session = service.client().new_session();

    let envelope = service
        .transform_with_cancel(&mut session, &args.query.to_query(), args.context(), cancel)
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_envelope(&envelope));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&envelope)?);
        }
    }

    Ok(())
}
