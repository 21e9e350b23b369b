//! External data source integrations
//!
//! - Yahoo Finance: quotes, daily closes, dividends and fundamentals

#[cfg(feature = "async")]
pub mod yahoo;

#[cfg(feature = "async")]
pub use yahoo::{YahooFinanceSource, YahooProvider};
