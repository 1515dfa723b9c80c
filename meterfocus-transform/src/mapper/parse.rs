//! Value parsers used by the FOCUS mapper.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use meterfocus_core::MappingError;

/// Timestamp layout used by the metering API.
pub const CHARGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Key that bare (non `key=value`) tag tokens are stored under.
pub const BARE_TAG_KEY: &str = "tag";

/// Decimal places kept on billed cost.
const COST_DECIMALS: i32 = 6;

/// Parses a metering timestamp and attaches UTC without conversion.
pub fn parse_charge_time(field: &str, value: &str) -> Result<DateTime<Utc>, MappingError> {
    if value.is_empty() {
        return Err(MappingError::new(field, "Empty datetime value."));
    }
    NaiveDateTime::parse_from_str(value, CHARGE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| MappingError::new(field, format!("Invalid datetime format: '{value}'")))
}

/// Parses a string-encoded price, falling back to `0.0`.
pub fn safe_price(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .unwrap_or(0.0)
}

/// Rounds a cost to six decimal places.
pub fn round_cost(value: f64) -> f64 {
    let factor = 10f64.powi(COST_DECIMALS);
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

/// Parses a comma-separated tag string.
///
/// `key=value` tokens become entries with trimmed key and value. A token
/// without `=` is stored under [`BARE_TAG_KEY`]; when several occur the
/// last one wins.
pub fn parse_tags(raw: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    if raw.trim().is_empty() {
        return tags;
    }

    for token in raw.split(',').map(str::trim) {
        if let Some((key, value)) = token.split_once('=') {
            tags.insert(key.trim().to_string(), value.trim().to_string());
        } else if !token.is_empty() {
            tags.insert(BARE_TAG_KEY.to_string(), token.to_string());
        }
    }
    tags
}
