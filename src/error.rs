//! Error types for rusty-portfolio
//!
//! Two layers: [`PortfolioError`] covers the ledger, configuration and I/O,
//! while [`ProviderError`] describes a failed market-data fetch. Provider
//! errors never reach the analytics engines; the fetch layer turns them into
//! sentinel values first.

use crate::types::Symbol;
use thiserror::Error;

/// Main error type for rusty-portfolio
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(feature = "rusqlite-support")]
impl From<rusqlite::Error> for PortfolioError {
    fn from(err: rusqlite::Error) -> Self {
        PortfolioError::Storage(err.to_string())
    }
}

/// Failure of a single market-data request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: Symbol, reason: String },

    #[error("Unknown symbol: {0}")]
    NotFound(Symbol),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Shorthand for [`ProviderError::Unavailable`]
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for rusty-portfolio operations
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Result type alias for market-data requests
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
