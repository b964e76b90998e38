//! Data ingestion and normalization for the stockcard system.
//!
//! This crate handles:
//! - Exchange prefix resolution for security codes
//! - Provider payload parsing (Sina quotes and klines, Eastmoney profile)
//! - Minute bar normalization
//! - The market data provider trait and its HTTP implementation

pub mod eastmoney;
pub mod normalizer;
pub mod provider;
pub mod sina;
pub mod symbol;

pub use normalizer::{normalize_bar, normalize_bars};
pub use provider::{MarketDataProvider, SinaProvider};
pub use symbol::{Market, SinaSymbol};
