//! Feishu interactive card assembly.
//!
//! Maps a [`StockReport`] into the card JSON understood by the Feishu
//! messaging API. Any value the report lacks is rendered as `N/A`.

use serde_json::{json, Value};
use stockcard_core::{SessionBucket, VolumeAnalysis};
use stockcard_features::{KlineSummary, StockReport};

/// Placeholder for missing values.
pub const NA: &str = "N/A";

/// RSI shown when it cannot be computed.
const RSI_NEUTRAL: f64 = 50.0;

/// Change above which the price row is flagged.
const HOT_CHANGE_PCT: f64 = 5.0;

const DISCLAIMER: &str =
    "⚠️ Disclaimer: generated from realtime market data for reference only. Not investment advice.";

/// Build the interactive card for one analyzed security.
pub fn build_stock_card(report: &StockReport) -> Value {
    let mut elements = vec![
        section_header(&format!("Data date: {}", report.updated_at.format("%Y-%m-%d"))),
        hr(),
    ];

    realtime_section(&mut elements, report);
    company_section(&mut elements, report);

    let kline = report.kline.as_ref();
    range_section(&mut elements, kline);
    moving_average_section(&mut elements, report.realtime.price, kline);
    indicator_section(&mut elements, kline);
    volume_section(&mut elements, report.minute_analysis.as_ref());
    signal_section(&mut elements, report);
    performance_section(&mut elements, kline);
    summary_section(&mut elements, report);

    elements.push(note(DISCLAIMER));

    json!({
        "config": { "wide_screen_mode": true },
        "header": {
            "template": "orange",
            "title": {
                "content": format!("📊 {}({}) analysis report", report.name, report.code),
                "tag": "plain_text",
            },
        },
        "elements": elements,
    })
}

fn realtime_section(elements: &mut Vec<Value>, report: &StockReport) {
    let rt = &report.realtime;
    elements.push(section_header("📈 Realtime quote"));
    elements.push(table_row(&["Metric", "Value"], &[1, 2], true));

    let hot = (rt.change_pct > HOT_CHANGE_PCT).then_some("🔥");
    elements.extend(info_row(
        "Price",
        &format!("¥{} ({:+.2}%)", rt.price, rt.change_pct),
        hot,
    ));
    elements.extend(info_row("Open", &money(rt.open), None));
    elements.extend(info_row("High", &money(rt.high), None));
    elements.extend(info_row("Low", &money(rt.low), None));
    elements.extend(info_row("Volume", &format!("{} lots", rt.volume), None));
    elements.extend(info_row(
        "Turnover",
        &format!("¥{:.2}M", rt.amount / 1_000_000.0),
        None,
    ));
}

fn company_section(elements: &mut Vec<Value>, report: &StockReport) {
    let company = report.company.as_ref();
    elements.push(section_header("🏢 Company"));
    elements.push(table_row(&["Item", "Data"], &[1, 2], true));

    let name = company
        .and_then(|c| c.name.clone())
        .unwrap_or_else(|| report.name.clone());
    let industry = company
        .and_then(|c| c.industry.clone())
        .unwrap_or_else(|| NA.to_string());
    // caps are in units of 1e8
    let cap = |v: Option<f64>| v.map_or_else(|| NA.to_string(), |v| format!("¥{:.2}B", v / 10.0));
    let listed = company
        .and_then(|c| c.list_date)
        .map_or_else(|| NA.to_string(), |d| d.format("%Y-%m-%d").to_string());

    elements.extend(info_row("Name", &name, None));
    elements.extend(info_row("Industry", &industry, None));
    elements.extend(info_row("Market cap", &cap(company.and_then(|c| c.total_cap)), None));
    elements.extend(info_row("Float cap", &cap(company.and_then(|c| c.float_cap)), None));
    elements.extend(info_row("Listed", &listed, None));
}

fn range_section(elements: &mut Vec<Value>, kline: Option<&KlineSummary>) {
    elements.push(section_header("📍 52-week position"));
    elements.push(table_row(&["Metric", "Value"], &[1, 2], true));
    elements.extend(info_row("52w high", &money(kline.map(|k| k.high_52w)), None));
    elements.extend(info_row("52w low", &money(kline.map(|k| k.low_52w)), None));
    elements.extend(info_row(
        "Position",
        &kline.map_or_else(|| NA.to_string(), |k| format!("{:.1}%", k.position)),
        None,
    ));
}

fn moving_average_section(elements: &mut Vec<Value>, price: f64, kline: Option<&KlineSummary>) {
    elements.push(section_header("📐 Moving averages"));
    elements.push(table_row(&["MA", "Price", "Status"], &[1, 1, 1], true));

    let rows = [
        ("MA5", kline.and_then(|k| k.ma5)),
        ("MA10", kline.and_then(|k| k.ma10)),
        ("MA20", kline.and_then(|k| k.ma20)),
    ];
    for (label, ma) in rows {
        let status = match ma {
            Some(ma) if price > ma => "✅ above",
            Some(_) => "❌ below",
            None => NA,
        };
        elements.push(column_set(&[label, money(ma).as_str(), status], Some(&[1, 1, 1]), None));
    }
    elements.push(hr());
}

fn indicator_section(elements: &mut Vec<Value>, kline: Option<&KlineSummary>) {
    elements.push(section_header("🔍 Technical indicators"));
    elements.push(table_row(&["Indicator", "Value", "Status"], &[1, 1, 1], true));

    let rsi = kline.and_then(|k| k.rsi).unwrap_or(RSI_NEUTRAL);
    elements.push(column_set(
        &["RSI(14)", format!("{rsi:.1}").as_str(), rsi_band(rsi)],
        Some(&[1, 1, 1]),
        None,
    ));

    let (macd, status) = match kline {
        Some(k) => (
            format!("{:.3}", k.macd),
            if k.macd_hist > 0.0 { "📈 bullish" } else { "📉 bearish" },
        ),
        None => (NA.to_string(), NA),
    };
    elements.push(column_set(&["MACD", macd.as_str(), status], Some(&[1, 1, 1]), None));
    elements.push(hr());
}

/// RSI band label: 30..=70 neutral.
pub fn rsi_band(rsi: f64) -> &'static str {
    if (30.0..=70.0).contains(&rsi) {
        "⚪ neutral"
    } else if rsi > 70.0 {
        "🔴 overbought"
    } else {
        "🟢 oversold"
    }
}

/// Display label of a session bucket.
pub fn bucket_label(bucket: SessionBucket) -> &'static str {
    match bucket {
        SessionBucket::Open30Min => "Open 30 min",
        SessionBucket::MidAm => "Mid-morning",
        SessionBucket::MidPm => "Mid-afternoon",
        SessionBucket::Close30Min => "Close 30 min",
    }
}

fn volume_section(elements: &mut Vec<Value>, analysis: Option<&VolumeAnalysis>) {
    elements.push(section_header("📊 Intraday volume"));
    elements.push(table_row(&["Session", "Volume", "Share"], &[2, 2, 1], true));

    let report = analysis.and_then(VolumeAnalysis::report);
    for bucket in SessionBucket::ALL {
        let (volume, percent) = match report {
            Some(r) => {
                let stat = r.bucket(bucket);
                (format!("{} lots", stat.volume), format!("{}%", stat.percent))
            }
            None => (NA.to_string(), NA.to_string()),
        };
        elements.push(column_set(
            &[bucket_label(bucket), volume.as_str(), percent.as_str()],
            Some(&[2, 2, 1]),
            None,
        ));
    }
    if let Some(reason) = analysis.and_then(VolumeAnalysis::empty_reason) {
        elements.push(lark_md(&format!("_{reason}_")));
    }
    elements.push(hr());
}

fn signal_section(elements: &mut Vec<Value>, report: &StockReport) {
    elements.push(section_header("🎯 Volume signals"));
    let signals = report.signals();
    if signals.is_empty() {
        elements.push(lark_md("No notable volume concentration."));
    }
    for signal in signals {
        elements.push(lark_md(&format!("🔥 **{signal}**")));
    }
}

fn performance_section(elements: &mut Vec<Value>, kline: Option<&KlineSummary>) {
    elements.push(hr());
    elements.push(section_header("📈 Period performance"));
    elements.push(column_set(&["Period", "Change"], Some(&[1, 2]), Some("blue")));
    elements.extend(info_row("1 month", &trend(kline.map(|k| k.month_1_change)), None));
    elements.extend(info_row("3 months", &trend(kline.map(|k| k.month_3_change)), None));
}

fn summary_section(elements: &mut Vec<Value>, report: &StockReport) {
    let kline = report.kline.as_ref();
    elements.push(hr());
    elements.push(section_header("📌 Summary"));
    elements.push(lark_md(&format!(
        "• Today: {:+.2}%\n• 1 month: {}\n• 3 months: {}",
        report.realtime.change_pct,
        signed_pct(kline.map(|k| k.month_1_change)),
        signed_pct(kline.map(|k| k.month_3_change)),
    )));
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("¥{v:.2}"))
}

fn signed_pct(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:+.2}%"))
}

fn trend(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("{v:+.2}% 🟢"),
        Some(v) => format!("{v:+.2}% 🔴"),
        None => NA.to_string(),
    }
}

/// A `column_set` of markdown cells.
///
/// Without explicit weights two columns split 1:2, three split 1:2:1, and
/// anything else is even.
pub fn column_set(cells: &[&str], weights: Option<&[u32]>, background: Option<&str>) -> Value {
    let columns: Vec<Value> = cells
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let weight = weights
                .and_then(|w| w.get(i).copied())
                .unwrap_or_else(|| default_weight(cells.len(), i));
            json!({
                "tag": "column",
                "width": "weighted",
                "weight": weight,
                "elements": [lark_md(content)],
            })
        })
        .collect();

    let mut set = json!({ "tag": "column_set", "flex_mode": "none", "columns": columns });
    if let Some(style) = background {
        set["background_style"] = json!(style);
    }
    set
}

fn default_weight(columns: usize, index: usize) -> u32 {
    match (columns, index) {
        (2, 0) => 1,
        (2, _) => 2,
        (3, 1) => 2,
        _ => 1,
    }
}

/// Table row; header rows get a grey background.
pub fn table_row(cells: &[&str], weights: &[u32], header: bool) -> Value {
    column_set(cells, Some(weights), header.then_some("grey"))
}

/// Label/value row (plus optional status column) followed by a divider.
pub fn info_row(label: &str, value: &str, status: Option<&str>) -> [Value; 2] {
    let row = match status {
        Some(status) => column_set(&[label, value, status], Some(&[1, 1, 1]), None),
        None => column_set(&[label, value], Some(&[1, 2]), None),
    };
    [row, hr()]
}

/// Bold section title.
pub fn section_header(title: &str) -> Value {
    lark_md(&format!("**{title}**"))
}

/// Plain-text footnote block.
pub fn note(content: &str) -> Value {
    json!({ "tag": "note", "elements": [{ "tag": "plain_text", "content": content }] })
}

fn lark_md(content: &str) -> Value {
    json!({ "tag": "div", "text": { "content": content, "tag": "lark_md" } })
}

fn hr() -> Value {
    json!({ "tag": "hr" })
}
