//! In-memory market data provider for tests and offline use

use crate::data::MarketDataProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{DividendEvent, Fundamentals, Price, PriceSeries, Symbol};
use chrono::NaiveDate;
use hashbrown::{HashMap, HashSet};

/// Fixture-backed provider. Symbols marked as failing return
/// [`ProviderError::Unavailable`] from every call.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    prices: HashMap<Symbol, Price>,
    history: HashMap<Symbol, PriceSeries>,
    dividends: HashMap<Symbol, Vec<DividendEvent>>,
    fundamentals: HashMap<Symbol, Fundamentals>,
    failing: HashSet<Symbol>,
}

impl InMemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Price) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_history(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.history.insert(symbol.to_string(), series);
        self
    }

    pub fn with_close(mut self, symbol: &str, date: NaiveDate, close: Price) -> Self {
        self.history
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
        self
    }

    pub fn with_dividend(mut self, symbol: &str, date: NaiveDate, amount: f64) -> Self {
        self.dividends
            .entry(symbol.to_string())
            .or_default()
            .push(DividendEvent::new(date, amount));
        self
    }

    pub fn with_fundamentals(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.to_string(), fundamentals);
        self
    }

    /// Make every request for `symbol` fail
    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    fn check(&self, symbol: &str) -> ProviderResult<()> {
        if self.failing.contains(symbol) {
            Err(ProviderError::unavailable(symbol, "simulated failure"))
        } else {
            Ok(())
        }
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn last_price(&self, symbol: &str) -> ProviderResult<Price> {
        self.check(symbol)?;
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    /// Returns the whole fixture series regardless of `days`
    fn history(&self, symbol: &str, _days: u32) -> ProviderResult<PriceSeries> {
        self.check(symbol)?;
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }

    fn dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendEvent>> {
        self.check(symbol)?;
        Ok(self.dividends.get(symbol).cloned().unwrap_or_default())
    }

    fn fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals> {
        self.check(symbol)?;
        self.fundamentals
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
