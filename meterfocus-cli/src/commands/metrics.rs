//! Metrics command - fetch raw metering records.

use anyhow::Result;
use clap::Args;
use meterfocus_core::{MetricsQuery, Period, DEFAULT_LOCALE, DEFAULT_TIME_ZONE};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Query arguments shared by the metrics and transform commands.
#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Region ID (e.g. lagos-mtn-1).
    #[arg(long)]
    pub region: String,

    /// Tenant / VDC domain ID.
    #[arg(long)]
    pub domain_id: String,

    /// Window start, "YYYY-MM-DD HH:MM:SS".
    #[arg(long)]
    pub start: String,

    /// Window end, "YYYY-MM-DD HH:MM:SS".
    #[arg(long)]
    pub end: String,

    /// Aggregation period: hourly, daily or monthly.
    #[arg(long, default_value = "daily")]
    pub period: Period,

    /// Resource type filter (e.g. hws.resource.type.volume).
    #[arg(long)]
    pub resource_type: Option<String>,

    /// Page size (1-1000).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Time zone name.
    #[arg(long, default_value = DEFAULT_TIME_ZONE)]
    pub time_zone: String,

    /// Locale: en_US or zh_CN.
    #[arg(long, default_value = DEFAULT_LOCALE)]
    pub locale: String,
}

impl MetricsArgs {
    /// Converts the arguments into a query.
    pub fn to_query(&self) -> MetricsQuery {
        let mut query = MetricsQuery::new(&self.region, &self.domain_id, &self.start, &self.end)
            .with_period(self.period);
        query.time_zone.clone_from(&self.time_zone);
        query.locale.clone_from(&self.locale);
        query.resource_type_code.clone_from(&self.resource_type);
        query.limit = self.limit;
        query
    }
}

/// Runs the metrics command.
pub async fn run(
    args: &MetricsArgs,
    cli: &Cli,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = config.source_client()?;
    let mut session = client.new_session();
    let query = args.to_query();

    let records = client
        .fetch_metrics_with_cancel(&mut session, &query, cancel)
        .await?;
    info!(count = records.len(), "Fetched metering records");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_metrics(&records));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&serde_json::json!({
                    "total": records.len(),
                    "metrics": records,
                }))?
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> MetricsArgs {
        MetricsArgs {
            region: "lagos-mtn-1".to_string(),
            domain_id: "dom-1".to_string(),
            start: "2025-04-01 00:00:00".to_string(),
            end: "2025-04-02 00:00:00".to_string(),
            period: Period::Monthly,
            resource_type: Some("hws.resource.type.vm".to_string()),
            limit: Some(100),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            locale: "zh_CN".to_string(),
        }
    }

    #[test]
    fn test_to_query() {
        let query = args().to_query();
        assert_eq!(query.region_code, "lagos-mtn-1");
        assert_eq!(query.period, Period::Monthly);
        assert_eq!(query.locale, "zh_CN");
        assert_eq!(query.resource_type_code.as_deref(), Some("hws.resource.type.vm"));
        assert_eq!(query.limit, Some(100));
        assert!(query.validate().is_ok());
    }
}
