//! Core data types for the stockcard system.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minutes since midnight, wall-clock.
pub type MinuteOfDay = u32;

/// Number of raw volume units (shares) per display lot.
pub const SHARES_PER_LOT: u64 = 100;

/// Build a minute-of-day value from an `HH:MM` pair.
#[inline]
pub const fn hhmm(hour: u32, minute: u32) -> MinuteOfDay {
    hour * 60 + minute
}

/// Truncate a time of day to minute resolution.
#[inline]
pub fn minute_of_day(time: NaiveTime) -> MinuteOfDay {
    hhmm(time.hour(), time.minute())
}

/// Convert raw shares to display lots, truncating.
#[inline]
pub fn to_lots(shares: u64) -> u64 {
    shares / SHARES_PER_LOT
}

/// Round to `dp` decimal places, ties to even on the exact binary value.
///
/// 6.25 rounds to 6.2 and 0.125 to 0.12, while 2.675 (stored just below the
/// tie) rounds to 2.67.
pub fn round_dp(value: f64, dp: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.dp$}").parse().unwrap_or(value)
}

/// Regular session bounds, both inclusive, at minute resolution.
pub const SESSION_START: MinuteOfDay = hhmm(9, 25);
pub const SESSION_END: MinuteOfDay = hhmm(15, 0);

/// A raw 1-minute record as delivered by a provider.
///
/// Numeric fields are kept as text; some providers quote numbers, some don't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMinuteBar {
    /// `YYYY-MM-DD HH:MM:SS`.
    #[serde(alias = "day")]
    pub time: String,
    #[serde(deserialize_with = "text_or_number")]
    pub open: String,
    #[serde(deserialize_with = "text_or_number")]
    pub high: String,
    #[serde(deserialize_with = "text_or_number")]
    pub low: String,
    #[serde(deserialize_with = "text_or_number")]
    pub close: String,
    #[serde(deserialize_with = "text_or_number")]
    pub volume: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub amount: String,
}

/// Accept a JSON string or number and keep its textual form.
pub fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

/// One validated intraday observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    /// Bar timestamp, minute resolution.
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded units in raw provider unit (shares).
    pub volume: u64,
    /// Traded value.
    pub amount: f64,
}

impl MinuteBar {
    /// Time of day at minute resolution.
    #[inline]
    pub fn minute_of_day(&self) -> MinuteOfDay {
        minute_of_day(self.timestamp.time())
    }

    /// Whether the bar is usable for volume analysis: traded, and within
    /// the regular session.
    #[inline]
    pub fn is_eligible(&self) -> bool {
        let m = self.minute_of_day();
        self.volume > 0 && (SESSION_START..=SESSION_END).contains(&m)
    }
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Realtime quote snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Six-digit security code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Last price.
    pub price: f64,
    pub open: Option<f64>,
    pub pre_close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Day volume in lots.
    pub volume: u64,
    /// Day turnover.
    pub amount: f64,
    /// Price change vs. previous close, 2 dp.
    pub change_amt: f64,
    /// Percent change vs. previous close, 2 dp.
    pub change_pct: f64,
}

/// Company profile figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub industry: Option<String>,
    /// Total market cap in units of 1e8.
    pub total_cap: Option<f64>,
    /// Float market cap in units of 1e8.
    pub float_cap: Option<f64>,
    pub list_date: Option<NaiveDate>,
}

/// Fixed time-of-day window used to partition session volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionBucket {
    /// 09:30 to 10:00.
    #[serde(rename = "open_30min")]
    Open30Min,
    /// 10:00 to 11:30.
    #[serde(rename = "mid_am")]
    MidAm,
    /// 13:00 to 14:30.
    #[serde(rename = "mid_pm")]
    MidPm,
    /// 14:30 to 15:00, inclusive of the closing minute.
    #[serde(rename = "close_30min")]
    Close30Min,
}

impl SessionBucket {
    /// All buckets in session order.
    pub const ALL: [SessionBucket; 4] = [
        SessionBucket::Open30Min,
        SessionBucket::MidAm,
        SessionBucket::MidPm,
        SessionBucket::Close30Min,
    ];

    /// Half-open `[start, end)` window.
    pub fn window(self) -> (MinuteOfDay, MinuteOfDay) {
        match self {
            SessionBucket::Open30Min => (hhmm(9, 30), hhmm(10, 0)),
            SessionBucket::MidAm => (hhmm(10, 0), hhmm(11, 30)),
            SessionBucket::MidPm => (hhmm(13, 0), hhmm(14, 30)),
            SessionBucket::Close30Min => (hhmm(14, 30), hhmm(15, 1)),
        }
    }

    /// Whether a minute falls in this bucket.
    #[inline]
    pub fn contains(self, minute: MinuteOfDay) -> bool {
        let (start, end) = self.window();
        (start..end).contains(&minute)
    }

    /// Bucket holding the given minute, if any. Pre-open and lunch minutes
    /// belong to no bucket.
    pub fn for_minute(minute: MinuteOfDay) -> Option<SessionBucket> {
        Self::ALL.into_iter().find(|b| b.contains(minute))
    }
}

/// Volume and share of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketStat {
    /// Volume in lots.
    pub volume: u64,
    /// Percent of eligible volume, 1 dp.
    pub percent: f64,
}

/// One of the highest-volume bars of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopVolumeBar {
    /// `HH:MM:SS`.
    pub time: String,
    /// Close price.
    pub price: f64,
    /// Volume in lots.
    pub volume: u64,
    pub amount: f64,
}

/// Qualitative volume-concentration signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum VolumeSignal {
    AggressiveLateSession,
    ModerateLateSession,
    EarlyAccumulation,
    AbnormalOpeningSurge,
}

impl VolumeSignal {
    /// Human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            VolumeSignal::AggressiveLateSession => {
                "aggressive late-session volume spike — possible institutional accumulation or distribution."
            }
            VolumeSignal::ModerateLateSession => "moderate late-session volume increase.",
            VolumeSignal::EarlyAccumulation => "strong early-session accumulation by large holders.",
            VolumeSignal::AbnormalOpeningSurge => {
                "abnormal opening volume surge — aggressive institutional entry."
            }
        }
    }
}

impl fmt::Display for VolumeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<VolumeSignal> for String {
    fn from(signal: VolumeSignal) -> Self {
        signal.message().to_string()
    }
}

/// Intraday volume distribution for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    /// Eligible volume in lots.
    pub total_volume: u64,
    /// Eligible turnover, unscaled.
    pub total_amount: f64,
    /// Per-bucket volume and share.
    pub distribution: BTreeMap<SessionBucket, BucketStat>,
    /// Up to ten highest-volume bars, descending.
    pub top_volumes: Vec<TopVolumeBar>,
    /// Signals in rule order.
    pub signals: Vec<VolumeSignal>,
}

impl VolumeReport {
    /// Stat for a bucket; zero when absent.
    pub fn bucket(&self, bucket: SessionBucket) -> BucketStat {
        self.distribution.get(&bucket).copied().unwrap_or_default()
    }
}

/// Outcome of analyzing one day of minute bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VolumeAnalysis {
    /// Analysis succeeded.
    Report(VolumeReport),
    /// The provider returned no bars.
    NoData,
    /// Bars were returned but none were traded within the session.
    NoUsableData,
}

impl VolumeAnalysis {
    /// The report, if any.
    pub fn report(&self) -> Option<&VolumeReport> {
        match self {
            VolumeAnalysis::Report(report) => Some(report),
            _ => None,
        }
    }

    /// Reason for an empty state.
    pub fn empty_reason(&self) -> Option<&'static str> {
        match self {
            VolumeAnalysis::Report(_) => None,
            VolumeAnalysis::NoData => Some("no minute data returned"),
            VolumeAnalysis::NoUsableData => Some("no traded bars within the session"),
        }
    }
}
