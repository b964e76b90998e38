//! Daily technical indicators.
//!
//! Moving averages, RSI, MACD, 52-week range position and period returns
//! computed from an ascending daily bar series.

use ordered_float::OrderedFloat;
use serde::Serialize;
use statrs::statistics::Statistics;
use stockcard_core::DailyBar;

/// RSI lookback.
pub const RSI_PERIOD: usize = 14;
/// MACD fast/slow/signal spans.
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
/// Trading days in roughly one and three months.
pub const MONTH_1_BARS: usize = 22;
pub const MONTH_3_BARS: usize = 66;

/// Indicator snapshot at the last bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KlineSummary {
    pub current: f64,
    pub high_52w: f64,
    pub low_52w: f64,
    /// Position of `current` within the range, percent.
    pub position: f64,
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub month_1_change: f64,
    pub month_3_change: f64,
}

impl KlineSummary {
    /// Compute the summary. `None` for an empty series.
    pub fn from_bars(bars: &[DailyBar]) -> Option<Self> {
        let last = bars.last()?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let current = last.close;

        let high_52w = bars.iter().map(|b| OrderedFloat(b.high)).max()?.0;
        let low_52w = bars.iter().map(|b| OrderedFloat(b.low)).min()?.0;
        let position = if high_52w != low_52w {
            (current - low_52w) / (high_52w - low_52w) * 100.0
        } else {
            0.0
        };

        let (macd, macd_signal, macd_hist) = macd(&closes)?;

        Some(Self {
            current,
            high_52w,
            low_52w,
            position,
            ma5: sma(&closes, 5),
            ma10: sma(&closes, 10),
            ma20: sma(&closes, 20),
            ma60: sma(&closes, 60),
            rsi: rsi(&closes, RSI_PERIOD),
            macd,
            macd_signal,
            macd_hist,
            month_1_change: period_change(&closes, MONTH_1_BARS),
            month_3_change: period_change(&closes, MONTH_3_BARS),
        })
    }
}

/// Mean of the trailing `window` values.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(values[values.len() - window..].iter().mean())
}

/// Exponential moving average series, `alpha = 2 / (span + 1)`, seeded with
/// the first value.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Relative strength index over simple means of the last `period` gains
/// and losses.
///
/// `None` with fewer than `period + 1` values, or when prices are flat.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let tail = &values[values.len() - period - 1..];
    let diffs: Vec<f64> = tail.windows(2).map(|w| w[1] - w[0]).collect();

    let gain = diffs.iter().map(|d| d.max(0.0)).mean();
    let loss = diffs.iter().map(|d| (-d).max(0.0)).mean();

    match (gain > 0.0, loss > 0.0) {
        (false, false) => None,
        (_, false) => Some(100.0),
        _ => Some(100.0 - 100.0 / (1.0 + gain / loss)),
    }
}

/// MACD line, signal line and histogram at the last value.
pub fn macd(values: &[f64]) -> Option<(f64, f64, f64)> {
    let fast = ema_series(values, MACD_FAST);
    let slow = ema_series(values, MACD_SLOW);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_series(&line, MACD_SIGNAL);

    let m = *line.last()?;
    let s = *signal.last()?;
    Some((m, s, m - s))
}

/// Percent change of the last value vs. the value `bars` back (counting the
/// last), or vs. the first value for shorter series.
pub fn period_change(values: &[f64], bars: usize) -> f64 {
    let (Some(&last), Some(&first)) = (values.last(), values.first()) else {
        return 0.0;
    };
    let base = if bars > 0 && values.len() >= bars {
        values[values.len() - bars]
    } else {
        first
    };
    if base == 0.0 {
        return 0.0;
    }
    (last - base) / base * 100.0
}
