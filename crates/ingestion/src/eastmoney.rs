//! Eastmoney company profile parsing.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use stockcard_core::{CompanyProfile, Result};

/// Field list requested from `qt/stock/get`.
pub const PROFILE_FIELDS: &str = "f57,f58,f116,f117,f127,f189";

const CAP_UNIT: f64 = 100_000_000.0;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Value>,
}

/// Parse a `qt/stock/get` response. A null `data` yields `None`.
pub fn parse_profile(text: &str) -> Result<Option<CompanyProfile>> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let Some(data) = envelope.data.filter(Value::is_object) else {
        return Ok(None);
    };

    Ok(Some(CompanyProfile {
        name: text_field(&data, "f58"),
        industry: text_field(&data, "f127"),
        total_cap: number_field(&data, "f116").map(|v| v / CAP_UNIT),
        float_cap: number_field(&data, "f117").map(|v| v / CAP_UNIT),
        list_date: text_field(&data, "f189")
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y%m%d").ok()),
    }))
}

fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() && s != "-" => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(data: &Value, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
