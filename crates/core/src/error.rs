//! Error types for the stockcard system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stockcard system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider record could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Market data provider failure (network, HTTP status, payload shape).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Messaging platform failure.
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration decoding error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Error::Provider(msg.into())
    }

    /// Create a messaging error.
    pub fn messaging(msg: impl Into<String>) -> Self {
        Error::Messaging(msg.into())
    }
}
