//! Sina finance payload parsing.
//!
//! Two formats:
//! - realtime quotes: `var hq_str_sz002405="name,open,pre_close,price,...";`
//! - kline data: JSONP wrapping a JSON array, `var _x=([{...},...]);`

use chrono::NaiveDate;
use serde::Deserialize;
use stockcard_core::{round_dp, text_or_number, to_lots, DailyBar, Error, Quote, RawMinuteBar, Result};

/// Minimum field count of a complete quote line.
const QUOTE_MIN_FIELDS: usize = 32;

/// Parse a realtime quote response into `(symbol, quote)` pairs.
///
/// Lines that are malformed, empty, truncated or carry no price are skipped.
pub fn parse_quotes(text: &str) -> Vec<(String, Quote)> {
    text.lines().filter_map(parse_quote_line).collect()
}

fn parse_quote_line(line: &str) -> Option<(String, Quote)> {
    let line = line.trim();
    let rest = line.strip_prefix("var hq_str_")?;
    let (symbol, rest) = rest.split_once("=\"")?;
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let (payload, _) = rest.split_once('"')?;
    if payload.is_empty() {
        return None;
    }

    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() < QUOTE_MIN_FIELDS {
        return None;
    }

    let price = opt_f64(fields[3])?;
    if price <= 0.0 {
        return None;
    }
    let pre_close = opt_f64(fields[2]);

    let change_amt = match pre_close {
        Some(pc) if pc != 0.0 => price - pc,
        _ => 0.0,
    };
    let change_pct = match pre_close {
        Some(pc) if pc > 0.0 => change_amt / pc * 100.0,
        _ => 0.0,
    };

    let volume = opt_f64(fields[8]).map(|v| v as u64).unwrap_or(0);
    let quote = Quote {
        code: symbol.get(2..).unwrap_or_default().to_string(),
        name: fields[0].to_string(),
        price,
        open: opt_f64(fields[1]),
        pre_close,
        high: opt_f64(fields[4]),
        low: opt_f64(fields[5]),
        volume: to_lots(volume),
        amount: opt_f64(fields[9]).unwrap_or(0.0),
        change_amt: round_dp(change_amt, 2),
        change_pct: round_dp(change_pct, 2),
    };
    Some((symbol.to_string(), quote))
}

fn opt_f64(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        None
    } else {
        field.parse().ok()
    }
}

/// Extract the JSON array body of a JSONP kline response.
///
/// Returns `None` when the payload carries no array.
fn jsonp_array(text: &str) -> Option<&str> {
    let start = text.find("([")?;
    let end = text.rfind("])")?;
    if end < start {
        return None;
    }
    Some(&text[start + 1..end + 1])
}

/// Parse a 1-minute kline response. A payload without an array is empty.
pub fn parse_minute_klines(text: &str) -> Result<Vec<RawMinuteBar>> {
    match jsonp_array(text) {
        Some(array) => Ok(serde_json::from_str(array)?),
        None => Ok(Vec::new()),
    }
}

#[derive(Debug, Deserialize)]
struct DailyKline {
    day: String,
    #[serde(deserialize_with = "text_or_number")]
    open: String,
    #[serde(deserialize_with = "text_or_number")]
    high: String,
    #[serde(deserialize_with = "text_or_number")]
    low: String,
    #[serde(deserialize_with = "text_or_number")]
    close: String,
    #[serde(deserialize_with = "text_or_number")]
    volume: String,
}

/// Parse a daily kline response.
pub fn parse_daily_klines(text: &str) -> Result<Vec<DailyBar>> {
    let Some(array) = jsonp_array(text) else {
        return Ok(Vec::new());
    };
    let items: Vec<DailyKline> = serde_json::from_str(array)?;
    items.iter().map(daily_bar).collect()
}

fn daily_bar(item: &DailyKline) -> Result<DailyBar> {
    let date_text = item.day.get(..10).unwrap_or(&item.day);
    let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
        .map_err(|_| Error::parse(format!("invalid kline day {:?}", item.day)))?;

    let num = |text: &str, field: &str| -> Result<f64> {
        text.trim()
            .parse()
            .map_err(|_| Error::parse(format!("invalid {field} {text:?} on {date_text}")))
    };

    Ok(DailyBar {
        date,
        open: num(&item.open, "open")?,
        high: num(&item.high, "high")?,
        low: num(&item.low, "low")?,
        close: num(&item.close, "close")?,
        volume: num(&item.volume, "volume")? as u64,
    })
}
