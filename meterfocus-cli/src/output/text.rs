//! Text output formatting with colors.

use meterfocus_core::{FocusRecord, RawMetricRecord, Region, TransformEnvelope, Vdc, DEFAULT_LOCALE};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const RULE_WIDTH: usize = 40;
const CHARGE_TIME_DISPLAY: &str = "%Y-%m-%d %H:%M";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    locale: String,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Set the locale used for localised region names.
    #[allow(dead_code)]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Formats the region catalog.
    pub fn format_regions(&self, regions: &[Region]) -> String {
        if regions.is_empty() {
            return self.dim("No regions.");
        }

        let mut lines = Vec::new();
        lines.push(self.header("Regions", regions.len()));

        for region in regions {
            let status = region.status.as_deref().unwrap_or("unknown");
            let status = if region.is_enabled() {
                self.green(status)
            } else {
                self.yellow(status)
            };
            lines.push(format!(
                "  {}  {}  {}",
                self.bold(&region.id),
                region.name.display(&self.locale),
                status
            ));
        }

        lines.join("\n")
    }

    /// Formats a VDC listing.
    pub fn format_vdcs(&self, vdcs: &[Vdc]) -> String {
        if vdcs.is_empty() {
            return self.dim("No VDCs.");
        }

        let mut lines = Vec::new();
        lines.push(self.header("VDCs", vdcs.len()));

        for vdc in vdcs {
            let level = vdc
                .level
                .map_or_else(|| "-".to_string(), |l| format!("L{l}"));
            let mut line = format!("  {} {}  {}", self.cyan(&level), self.bold(&vdc.name), vdc.id);
            if let Some(domain) = vdc.domain_name.as_deref().or(vdc.domain_id.as_deref()) {
                line.push_str(&self.dim(&format!("  domain: {domain}")));
            }
            if !vdc.enabled {
                line.push_str(&format!("  {}", self.red("disabled")));
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Formats raw metering records.
    pub fn format_metrics(&self, records: &[RawMetricRecord]) -> String {
        if records.is_empty() {
            return self.dim("No metering records.");
        }

        let mut lines = Vec::new();
        lines.push(self.header("Metering records", records.len()));

        for record in records {
            lines.push(format!(
                "  {}  {} → {}",
                self.bold(&record.id),
                record.start_time,
                record.end_time
            ));
            lines.push(self.dim(&format!(
                "    {}  {} {}  price {}",
                record.resource_type_code, record.usage_value, record.meter_unit_name, record.price
            )));
        }

        lines.join("\n")
    }

    /// Formats a transform envelope: summary first, then one line per row.
    pub fn format_envelope(&self, envelope: &TransformEnvelope) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{} FOCUS Report", self.bold("HCS")));
        lines.push("─".repeat(RULE_WIDTH));
        lines.push(format!("Status:      {}", self.green(envelope.status())));
        lines.push(format!("Rows:        {}", envelope.total_count()));

        let currency = envelope
            .records()
            .first()
            .map_or("", |r| r.billing_currency.as_str());
        lines.push(format!(
            "Billed cost: {}",
            self.green(&format_cost(envelope.total_billed_cost(), currency))
        ));

        for key in ["region_code", "period", "start_time", "end_time"] {
            if let Some(value) = envelope.metadata().get(key).and_then(|v| v.as_str()) {
                lines.push(self.dim(&format!("{key}: {value}")));
            }
        }

        if !envelope.records().is_empty() {
            lines.push(String::new());
            for record in envelope.records() {
                lines.push(self.format_row(record));
            }
        }

        lines.join("\n")
    }

    fn format_row(&self, record: &FocusRecord) -> String {
        let name = if record.resource_name.is_empty() {
            &record.resource_id
        } else {
            &record.resource_name
        };
        format!(
            "  {}  {}  {} {}  {}",
            self.dim(&record.charge_period_start.format(CHARGE_TIME_DISPLAY).to_string()),
            self.bold(name),
            record.usage,
            record.unit,
            self.green(&format_cost(record.billed_cost, &record.billing_currency))
        )
    }

    fn header(&self, title: &str, count: usize) -> String {
        format!("{} {}", self.bold(title), self.dim(&format!("({count})")))
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_colors {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        if self.use_colors {
            format!("{GREEN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn yellow(&self, text: &str) -> String {
        if self.use_colors {
            format!("{YELLOW}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_colors {
            format!("{RED}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn cyan(&self, text: &str) -> String {
        if self.use_colors {
            format!("{CYAN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn format_cost(amount: f64, currency: &str) -> String {
    if currency.is_empty() {
        format!("{amount:.2}")
    } else {
        format!("{amount:.2} {currency}")
    }
}
