//! Market data provider abstraction and the Sina/Eastmoney HTTP implementation.
//!
//! The [`MarketDataProvider`] trait lets the analysis engine run against a
//! live source or an in-memory mock.

use crate::{eastmoney, sina, symbol::SinaSymbol};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::time::Duration;
use stockcard_core::{
    config::ProviderConfig, CompanyProfile, DailyBar, Error, Quote, RawMinuteBar, Result,
};
use tracing::debug;

const SINA_QUOTE_URL: &str = "https://hq.sinajs.cn/list=";
const SINA_KLINE_URL: &str = "https://quotes.sina.cn/cn/api/jsonp_v2.php";
const EASTMONEY_QUOTE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";

/// Kline scale in minutes.
const SCALE_MINUTE: u32 = 1;
const SCALE_DAILY: u32 = 240;

/// Source of quotes, bars and company data for one security at a time.
pub trait MarketDataProvider {
    /// Latest quote, or `None` when the provider has nothing usable.
    fn fetch_quote(&self, symbol: &SinaSymbol) -> Result<Option<Quote>>;

    /// The most recent `count` 1-minute bars, ascending.
    fn fetch_minute_bars(&self, symbol: &SinaSymbol, count: u32) -> Result<Vec<RawMinuteBar>>;

    /// The most recent `count` daily bars, ascending.
    fn fetch_daily_bars(&self, symbol: &SinaSymbol, count: u32) -> Result<Vec<DailyBar>>;

    /// Company profile, or `None` when unknown.
    fn fetch_company(&self, symbol: &SinaSymbol) -> Result<Option<CompanyProfile>>;
}

/// Blocking HTTP provider backed by Sina (quotes, klines) and Eastmoney (profile).
pub struct SinaProvider {
    client: Client,
}

impl SinaProvider {
    /// Build a provider from configuration.
    ///
    /// With `bypass_proxy` set the client ignores system proxy settings for
    /// its own requests only.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&config.referer)
            .map_err(|e| Error::config(format!("invalid referer: {e}")))?;
        headers.insert(REFERER, referer);

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers);
        if config.bypass_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(http_error)?;
        Ok(Self { client })
    }

    fn get_text(&self, url: &str, query: &[(&str, String)], charset: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::provider(format!("{url} returned HTTP {status}")));
        }
        response.text_with_charset(charset).map_err(http_error)
    }

    fn fetch_klines(&self, symbol: &SinaSymbol, scale: u32, count: u32) -> Result<String> {
        let url = format!(
            "{SINA_KLINE_URL}/var%20_{symbol}=/CN_MarketDataService.getKLineData"
        );
        let query = [
            ("symbol", symbol.to_string()),
            ("scale", scale.to_string()),
            ("ma", "no".to_string()),
            ("datalen", count.to_string()),
        ];
        self.get_text(&url, &query, "utf-8")
    }
}

impl MarketDataProvider for SinaProvider {
    fn fetch_quote(&self, symbol: &SinaSymbol) -> Result<Option<Quote>> {
        let url = format!("{SINA_QUOTE_URL}{symbol}");
        let text = self.get_text(&url, &[], "gbk")?;
        let wanted = symbol.to_string();
        let quote = sina::parse_quotes(&text)
            .into_iter()
            .find(|(s, _)| *s == wanted)
            .map(|(_, q)| q);
        debug!(%symbol, found = quote.is_some(), "fetched quote");
        Ok(quote)
    }

    fn fetch_minute_bars(&self, symbol: &SinaSymbol, count: u32) -> Result<Vec<RawMinuteBar>> {
        let text = self.fetch_klines(symbol, SCALE_MINUTE, count)?;
        let bars = sina::parse_minute_klines(&text)?;
        debug!(%symbol, bars = bars.len(), "fetched minute bars");
        Ok(bars)
    }

    fn fetch_daily_bars(&self, symbol: &SinaSymbol, count: u32) -> Result<Vec<DailyBar>> {
        let text = self.fetch_klines(symbol, SCALE_DAILY, count)?;
        let bars = sina::parse_daily_klines(&text)?;
        debug!(%symbol, bars = bars.len(), "fetched daily bars");
        Ok(bars)
    }

    fn fetch_company(&self, symbol: &SinaSymbol) -> Result<Option<CompanyProfile>> {
        let query = [
            ("secid", symbol.eastmoney_secid()),
            ("fields", eastmoney::PROFILE_FIELDS.to_string()),
        ];
        let text = self.get_text(EASTMONEY_QUOTE_URL, &query, "utf-8")?;
        eastmoney::parse_profile(&text)
    }
}

fn http_error(err: reqwest::Error) -> Error {
    Error::provider(err.to_string())
}
