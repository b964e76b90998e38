//! Minute bar normalization.
//!
//! Converts raw provider records into typed [`MinuteBar`]s. Input order is
//! preserved; session filtering is left to the analyzer so that "no bars"
//! and "no usable bars" stay distinguishable.

use chrono::NaiveDateTime;
use std::str::FromStr;
use stockcard_core::{Error, MinuteBar, RawMinuteBar, Result};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Normalize a provider response.
///
/// Any unparseable field fails the whole batch.
pub fn normalize_bars(raw: &[RawMinuteBar]) -> Result<Vec<MinuteBar>> {
    raw.iter().map(normalize_bar).collect()
}

/// Normalize a single record.
pub fn normalize_bar(raw: &RawMinuteBar) -> Result<MinuteBar> {
    Ok(MinuteBar {
        timestamp: parse_timestamp(&raw.time)?,
        open: parse_field(&raw.open, "open", &raw.time)?,
        high: parse_field(&raw.high, "high", &raw.time)?,
        low: parse_field(&raw.low, "low", &raw.time)?,
        close: parse_field(&raw.close, "close", &raw.time)?,
        volume: parse_field(&raw.volume, "volume", &raw.time)?,
        amount: parse_field(&raw.amount, "amount", &raw.time)?,
    })
}

/// Parse `YYYY-MM-DD HH:MM:SS` (seconds optional).
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::parse(format!("invalid bar time {text:?}")))
}

fn parse_field<T: FromStr>(text: &str, field: &str, time: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::parse(format!("invalid {field} {text:?} in bar at {time}")))
}
