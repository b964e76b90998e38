//! Stock analysis engine.
//!
//! Combines provider fetches, normalization, volume analysis and daily
//! indicators into one [`StockAnalysis`] per security.

use crate::{indicators::KlineSummary, volume::VolumeDistributionAnalyzer};
use chrono::{DateTime, Local};
use serde::Serialize;
use stockcard_core::{CompanyProfile, Config, Quote, Result, VolumeAnalysis, VolumeSignal};
use stockcard_ingestion::{normalize_bars, MarketDataProvider, SinaSymbol};
use tracing::{debug, info, warn};

/// Full analysis of one security.
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub code: String,
    pub name: String,
    pub realtime: Quote,
    /// Present only when minute analysis was requested and the fetch worked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute_analysis: Option<VolumeAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kline: Option<KlineSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyProfile>,
    pub updated_at: DateTime<Local>,
}

impl StockReport {
    /// Volume signals, empty without a minute report.
    pub fn signals(&self) -> &[VolumeSignal] {
        self.minute_analysis
            .as_ref()
            .and_then(VolumeAnalysis::report)
            .map(|r| r.signals.as_slice())
            .unwrap_or(&[])
    }
}

/// Outcome for one requested code.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StockAnalysis {
    Ok(Box<StockReport>),
    Failed { code: String, error: String },
}

impl StockAnalysis {
    /// The report, if the quote could be fetched.
    pub fn report(&self) -> Option<&StockReport> {
        match self {
            StockAnalysis::Ok(report) => Some(&**report),
            StockAnalysis::Failed { .. } => None,
        }
    }
}

/// Runs the per-security analysis against a provider.
pub struct StockAnalyzer<'a> {
    provider: &'a dyn MarketDataProvider,
    volume: VolumeDistributionAnalyzer,
    minute_bar_count: u32,
    daily_bar_count: u32,
}

impl<'a> StockAnalyzer<'a> {
    /// Create an analyzer from configuration.
    pub fn new(provider: &'a dyn MarketDataProvider, config: &Config) -> Self {
        Self {
            provider,
            volume: VolumeDistributionAnalyzer::new(config.thresholds),
            minute_bar_count: config.provider.minute_bar_count,
            daily_bar_count: config.provider.daily_bar_count,
        }
    }

    /// Analyze one code. Only a missing quote fails the analysis; other
    /// sections are dropped with a warning.
    pub fn analyze(&self, code: &str, with_minute: bool) -> StockAnalysis {
        let symbol = SinaSymbol::from_code(code);

        let quote = match self.provider.fetch_quote(&symbol) {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                warn!(%symbol, "no quote returned");
                return failed(code);
            }
            Err(e) => {
                warn!(%symbol, error = %e, "quote fetch failed");
                return failed(code);
            }
        };
        info!(%symbol, name = %quote.name, price = quote.price, "quote fetched");

        let minute_analysis = if with_minute {
            self.minute_analysis(&symbol)
                .map_err(|e| warn!(%symbol, error = %e, "minute analysis skipped"))
                .ok()
        } else {
            None
        };

        let kline = self
            .provider
            .fetch_daily_bars(&symbol, self.daily_bar_count)
            .map_err(|e| warn!(%symbol, error = %e, "daily bars unavailable"))
            .ok()
            .and_then(|bars| KlineSummary::from_bars(&bars));

        let company = self
            .provider
            .fetch_company(&symbol)
            .map_err(|e| warn!(%symbol, error = %e, "company profile unavailable"))
            .ok()
            .flatten();

        StockAnalysis::Ok(Box::new(StockReport {
            code: code.to_string(),
            name: quote.name.clone(),
            realtime: quote,
            minute_analysis,
            kline,
            company,
            updated_at: Local::now(),
        }))
    }

    fn minute_analysis(&self, symbol: &SinaSymbol) -> Result<VolumeAnalysis> {
        let raw = self.provider.fetch_minute_bars(symbol, self.minute_bar_count)?;
        let bars = normalize_bars(&raw)?;
        let analysis = self.volume.analyze(&bars);
        debug!(%symbol, bars = bars.len(), outcome = ?analysis.empty_reason(), "volume analyzed");
        Ok(analysis)
    }
}

fn failed(code: &str) -> StockAnalysis {
    StockAnalysis::Failed {
        code: code.to_string(),
        error: format!("unable to fetch data for {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcard_core::{DailyBar, Error, RawMinuteBar, SessionBucket};

    #[derive(Default)]
    struct MockProvider {
        quote: Option<Quote>,
        quote_error: bool,
        minute: Vec<RawMinuteBar>,
        minute_error: bool,
        daily: Vec<DailyBar>,
        company: Option<CompanyProfile>,
    }

    impl MarketDataProvider for MockProvider {
        fn fetch_quote(&self, _symbol: &SinaSymbol) -> Result<Option<Quote>> {
            if self.quote_error {
                return Err(Error::provider("connection refused"));
            }
            Ok(self.quote.clone())
        }

        fn fetch_minute_bars(&self, _symbol: &SinaSymbol, _count: u32) -> Result<Vec<RawMinuteBar>> {
            if self.minute_error {
                return Err(Error::provider("timeout"));
            }
            Ok(self.minute.clone())
        }

        fn fetch_daily_bars(&self, _symbol: &SinaSymbol, _count: u32) -> Result<Vec<DailyBar>> {
            Ok(self.daily.clone())
        }

        fn fetch_company(&self, _symbol: &SinaSymbol) -> Result<Option<CompanyProfile>> {
            Ok(self.company.clone())
        }
    }

    fn quote() -> Quote {
        Quote {
            code: "002405".into(),
            name: "SiWei".into(),
            price: 12.6,
            open: Some(12.3),
            pre_close: Some(12.0),
            high: Some(12.9),
            low: Some(12.1),
            volume: 12345,
            amount: 15_432_100.0,
            change_amt: 0.6,
            change_pct: 5.0,
        }
    }

    fn raw(time: &str, volume: &str) -> RawMinuteBar {
        RawMinuteBar {
            time: format!("2024-06-03 {time}:00"),
            open: "12.5".into(),
            high: "12.6".into(),
            low: "12.4".into(),
            close: "12.5".into(),
            volume: volume.into(),
            amount: "1000.0".into(),
        }
    }

    fn analyze(provider: &MockProvider, with_minute: bool) -> StockAnalysis {
        StockAnalyzer::new(provider, &Config::default()).analyze("002405", with_minute)
    }

    #[test]
    fn test_missing_quote_fails() {
        let provider = MockProvider::default();
        match analyze(&provider, true) {
            StockAnalysis::Failed { code, error } => {
                assert_eq!(code, "002405");
                assert_eq!(error, "unable to fetch data for 002405");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_quote_error_fails() {
        let provider = MockProvider {
            quote: Some(quote()),
            quote_error: true,
            ..MockProvider::default()
        };
        assert!(analyze(&provider, false).report().is_none());
    }

    #[test]
    fn test_minute_skipped_unless_requested() {
        let provider = MockProvider {
            quote: Some(quote()),
            minute: vec![raw("09:45", "1000")],
            ..MockProvider::default()
        };
        let analysis = analyze(&provider, false);
        let report = analysis.report().unwrap();
        assert!(report.minute_analysis.is_none());
        assert_eq!(report.name, "SiWei");
    }

    #[test]
    fn test_minute_report() {
        let provider = MockProvider {
            quote: Some(quote()),
            minute: vec![raw("09:45", "6000"), raw("10:30", "4000")],
            ..MockProvider::default()
        };
        let analysis = analyze(&provider, true);
        let report = analysis.report().unwrap();
        let volume = report.minute_analysis.as_ref().unwrap().report().unwrap();

        assert_eq!(volume.total_volume, 100);
        assert_eq!(volume.bucket(SessionBucket::Open30Min).volume, 60);
        assert_eq!(
            report.signals(),
            &[VolumeSignal::EarlyAccumulation, VolumeSignal::AbnormalOpeningSurge]
        );
    }

    #[test]
    fn test_empty_minute_data_is_reported() {
        let provider = MockProvider {
            quote: Some(quote()),
            ..MockProvider::default()
        };
        let analysis = analyze(&provider, true);
        let report = analysis.report().unwrap();
        assert_eq!(report.minute_analysis, Some(VolumeAnalysis::NoData));
        assert!(report.signals().is_empty());
    }

    #[test]
    fn test_minute_fetch_error_drops_section() {
        let provider = MockProvider {
            quote: Some(quote()),
            minute_error: true,
            ..MockProvider::default()
        };
        let analysis = analyze(&provider, true);
        assert!(analysis.report().unwrap().minute_analysis.is_none());
    }

    #[test]
    fn test_malformed_minute_bar_drops_section() {
        let provider = MockProvider {
            quote: Some(quote()),
            minute: vec![raw("09:45", "1000"), raw("09:46", "abc")],
            ..MockProvider::default()
        };
        let analysis = analyze(&provider, true);
        assert!(analysis.report().unwrap().minute_analysis.is_none());
    }

    #[test]
    fn test_json_shape() {
        let provider = MockProvider {
            quote: Some(quote()),
            ..MockProvider::default()
        };
        let json = serde_json::to_value(analyze(&provider, false)).unwrap();
        assert_eq!(json["code"], "002405");
        assert_eq!(json["realtime"]["price"], 12.6);
        assert!(json.get("minute_analysis").is_none());

        let failed = serde_json::to_value(failed("600000")).unwrap();
        assert_eq!(failed["error"], "unable to fetch data for 600000");
    }
}
