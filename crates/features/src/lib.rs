//! Feature computation for the stockcard system.
//!
//! This crate handles:
//! - Intraday volume distribution (session buckets, ranking, signals)
//! - Daily technical indicators (MA, RSI, MACD, range position)
//! - Per-security analysis against a market data provider

pub mod engine;
pub mod indicators;
pub mod volume;

pub use engine::{StockAnalysis, StockAnalyzer, StockReport};
pub use indicators::KlineSummary;
pub use volume::{VolumeDistributionAnalyzer, TOP_VOLUME_COUNT};
