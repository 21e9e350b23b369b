//! Market data access
//!
//! [`MarketDataProvider`] is the seam to the outside world. Everything
//! behind it may fail; [`fetch`] runs requests through bounded worker pools
//! and converts failures into sentinels before the engines see them.

pub mod fetch;
pub mod in_memory;
pub mod sources;

pub use fetch::{fetch_dividends, fetch_fundamentals, fetch_history, fetch_last_prices, resolve_last_price, FetchPool};
pub use in_memory::InMemoryProvider;

use crate::error::ProviderResult;
use crate::types::{DividendEvent, Fundamentals, Price, PriceSeries};

/// Source of prices, dividends and fundamentals for a symbol
pub trait MarketDataProvider: Send + Sync {
    /// Latest traded price
    fn last_price(&self, symbol: &str) -> ProviderResult<Price>;

    /// Daily closes covering the last `days` calendar days
    fn history(&self, symbol: &str, days: u32) -> ProviderResult<PriceSeries>;

    /// Every known dividend event, dates already timezone-naive
    fn dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendEvent>>;

    /// Fundamental snapshot
    fn fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals>;

    /// Get the source name
    fn name(&self) -> &str;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for std::sync::Arc<P> {
    fn last_price(&self, symbol: &str) -> ProviderResult<Price> {
        (**self).last_price(symbol)
    }

    fn history(&self, symbol: &str, days: u32) -> ProviderResult<PriceSeries> {
        (**self).history(symbol, days)
    }

    fn dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendEvent>> {
        (**self).dividends(symbol)
    }

    fn fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals> {
        (**self).fundamentals(symbol)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
