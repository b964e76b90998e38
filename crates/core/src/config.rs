//! Configuration structures for the stockcard system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`FeishuConfig::app_id`].
pub const ENV_FEISHU_APP_ID: &str = "FEISHU_APP_ID";
/// Environment variable overriding [`FeishuConfig::app_secret`].
pub const ENV_FEISHU_APP_SECRET: &str = "FEISHU_APP_SECRET";

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Volume signal thresholds.
    pub thresholds: SignalThresholds,
    /// Market data provider configuration.
    pub provider: ProviderConfig,
    /// Feishu messaging configuration.
    pub feishu: FeishuConfig,
}

impl Config {
    /// Parse a configuration from TOML text. Missing sections use defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay Feishu credentials from the environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay Feishu credentials using the given variable lookup.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(ENV_FEISHU_APP_ID).filter(|v| !v.is_empty()) {
            self.feishu.app_id = Some(id);
        }
        if let Some(secret) = lookup(ENV_FEISHU_APP_SECRET).filter(|v| !v.is_empty()) {
            self.feishu.app_secret = Some(secret);
        }
    }

    /// Check value ranges and cross-field ordering.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.provider.validate()
    }
}

/// Ratio thresholds (bucket volume / total volume) for volume signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// Close-30min ratio above which the aggressive late-session signal fires.
    pub late_session_high: f64,
    /// Close-30min ratio above which the moderate late-session signal fires.
    pub late_session_moderate: f64,
    /// Open-30min ratio above which early accumulation is reported.
    pub open_surge: f64,
    /// Open-30min ratio above which the abnormal opening surge is reported.
    pub open_surge_extreme: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            late_session_high: 0.25,
            late_session_moderate: 0.15,
            open_surge: 0.30,
            open_surge_extreme: 0.40,
        }
    }
}

impl SignalThresholds {
    fn validate(&self) -> Result<()> {
        let named = [
            ("late_session_high", self.late_session_high),
            ("late_session_moderate", self.late_session_moderate),
            ("open_surge", self.open_surge),
            ("open_surge_extreme", self.open_surge_extreme),
        ];
        for (name, value) in named {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::config(format!(
                    "thresholds.{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.late_session_moderate > self.late_session_high {
            return Err(Error::config(
                "thresholds.late_session_moderate must not exceed late_session_high",
            ));
        }
        if self.open_surge > self.open_surge_extreme {
            return Err(Error::config(
                "thresholds.open_surge must not exceed open_surge_extreme",
            ));
        }
        Ok(())
    }
}

/// Market data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Number of 1-minute bars requested per fetch.
    pub minute_bar_count: u32,
    /// Number of daily bars requested for indicator computation.
    pub daily_bar_count: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Ignore system proxy settings for provider requests.
    pub bypass_proxy: bool,
    /// User-Agent header sent to the provider.
    pub user_agent: String,
    /// Referer header sent to the provider.
    pub referer: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            minute_bar_count: 250,
            daily_bar_count: 320,
            timeout_secs: 10,
            bypass_proxy: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            referer: "https://finance.sina.com.cn".to_string(),
        }
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<()> {
        if self.minute_bar_count == 0 {
            return Err(Error::config("provider.minute_bar_count must be positive"));
        }
        if self.daily_bar_count == 0 {
            return Err(Error::config("provider.daily_bar_count must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("provider.timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Feishu (Lark) open platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeishuConfig {
    /// Open API base URL.
    pub base_url: String,
    /// Application id.
    pub app_id: Option<String>,
    /// Application secret. Never written back out.
    #[serde(skip_serializing)]
    pub app_secret: Option<String>,
}

impl Default for FeishuConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.feishu.cn".to_string(),
            app_id: None,
            app_secret: None,
        }
    }
}
