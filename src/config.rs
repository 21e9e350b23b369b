//! Portfolio configuration

use crate::error::{PortfolioError, Result};
use crate::finance::scoring::DEFAULT_BLUE_CHIPS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime settings shared by the service and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// SQLite ledger location
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Concurrent price/history requests
    #[serde(default = "default_price_workers")]
    pub price_workers: usize,

    /// Concurrent dividend requests
    #[serde(default = "default_dividend_workers")]
    pub dividend_workers: usize,

    /// Calendar days of daily closes fetched for the dashboard
    #[serde(default = "default_history_period_days")]
    pub history_period_days: u32,

    /// Exchange suffix appended to bare tickers and stripped for display
    #[serde(default = "default_exchange_suffix")]
    pub exchange_suffix: String,

    /// Tickers treated as long-established listings
    #[serde(default = "default_blue_chips")]
    pub blue_chips: Vec<String>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("portfolio.db")
}

fn default_price_workers() -> usize {
    5
}

fn default_dividend_workers() -> usize {
    4
}

fn default_history_period_days() -> u32 {
    183
}

fn default_exchange_suffix() -> String {
    ".SA".to_string()
}

fn default_blue_chips() -> Vec<String> {
    DEFAULT_BLUE_CHIPS.iter().map(|s| s.to_string()).collect()
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            price_workers: default_price_workers(),
            dividend_workers: default_dividend_workers(),
            history_period_days: default_history_period_days(),
            exchange_suffix: default_exchange_suffix(),
            blue_chips: default_blue_chips(),
        }
    }
}

impl PortfolioConfig {
    /// Check the settings for values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.price_workers == 0 {
            return Err(PortfolioError::Config(
                "price_workers must be at least 1".to_string(),
            ));
        }
        if self.dividend_workers == 0 {
            return Err(PortfolioError::Config(
                "dividend_workers must be at least 1".to_string(),
            ));
        }
        if self.history_period_days < 2 {
            return Err(PortfolioError::Config(format!(
                "history_period_days must cover at least two days, got {}",
                self.history_period_days
            )));
        }
        if !self.exchange_suffix.is_empty() && !self.exchange_suffix.starts_with('.') {
            return Err(PortfolioError::Config(format!(
                "exchange_suffix must start with '.', got '{}'",
                self.exchange_suffix
            )));
        }
        Ok(())
    }

    /// Exchange-qualified form of a user-supplied ticker
    ///
    /// `petr4` becomes `PETR4.SA`; an already-qualified ticker is kept.
    pub fn qualify(&self, ticker: &str) -> String {
        let ticker = ticker.trim().to_uppercase();
        if self.exchange_suffix.is_empty() || ticker.ends_with(&self.exchange_suffix) {
            ticker
        } else {
            format!("{}{}", ticker, self.exchange_suffix)
        }
    }

    /// Display form of a ticker, without the exchange suffix
    pub fn display(&self, ticker: &str) -> String {
        let ticker = ticker.trim().to_uppercase();
        match ticker.strip_suffix(self.exchange_suffix.as_str()) {
            Some(bare) if !self.exchange_suffix.is_empty() => bare.to_string(),
            _ => ticker,
        }
    }
}
