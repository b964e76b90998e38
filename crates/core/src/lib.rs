//! Core types and configuration for the stockcard system.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (minute bars, daily bars, quotes, company profile)
//! - Volume distribution report types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
