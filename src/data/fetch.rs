//! Bounded per-symbol fan-out
//!
//! Each batch runs on its own fixed-size rayon pool so provider fan-out stays
//! within a known concurrency limit. A failing (or panicking) task only
//! loses its own symbol; the batch always completes and is merged into a
//! symbol-keyed map before anything downstream runs.

use crate::data::MarketDataProvider;
use crate::error::ProviderResult;
use crate::sanitize::sanitize;
use crate::types::{DividendEvent, Fundamentals, Price, PriceSeries, Symbol};
use hashbrown::HashMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Days of history requested when the live quote is missing
const LAST_PRICE_FALLBACK_DAYS: u32 = 1;

/// Fixed-size worker pool for independent fetches
pub struct FetchPool {
    workers: usize,
    pool: Option<ThreadPool>,
}

impl FetchPool {
    /// Build a pool with `workers` threads (at least one)
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fetch-{}", i))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("Failed to build fetch pool, fetching sequentially: {}", e);
                None
            }
        };

        Self { workers, pool }
    }

    /// Run `task` once per symbol and collect the successful results
    pub fn run<T, F>(&self, symbols: &[Symbol], task: F) -> HashMap<Symbol, T>
    where
        T: Send,
        F: Fn(&str) -> Option<T> + Sync,
    {
        let isolated = |symbol: &Symbol| -> Option<(Symbol, T)> {
            match catch_unwind(AssertUnwindSafe(|| task(symbol.as_str()))) {
                Ok(result) => result.map(|value| (symbol.clone(), value)),
                Err(_) => {
                    log::warn!("Fetch task for {} panicked", symbol);
                    None
                }
            }
        };

        log::debug!("Fetching {} symbols on {} workers", symbols.len(), self.workers);
        let results: Vec<(Symbol, T)> = match &self.pool {
            Some(pool) => pool.install(|| symbols.par_iter().filter_map(isolated).collect()),
            None => symbols.iter().filter_map(isolated).collect(),
        };

        results.into_iter().collect()
    }
}

/// Latest price with the quote-then-history fallback, as a raw result
pub fn resolve_last_price<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
) -> ProviderResult<Price> {
    match provider.last_price(symbol) {
        Ok(price) if sanitize(&price) > 0.0 => return Ok(price),
        Ok(_) => log::debug!("{}: empty quote, trying daily history", symbol),
        Err(e) => log::debug!("{}: quote failed ({}), trying daily history", symbol, e),
    }

    let series = provider.history(symbol, LAST_PRICE_FALLBACK_DAYS)?;
    Ok(series.last_valid().unwrap_or(0.0))
}

/// Last prices for every symbol; `0.0` marks an unavailable price
pub fn fetch_last_prices<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbols: &[Symbol],
    workers: usize,
) -> HashMap<Symbol, Price> {
    FetchPool::new(workers).run(symbols, |symbol| {
        let price = match resolve_last_price(provider, symbol) {
            Ok(price) => sanitize(&price),
            Err(e) => {
                log::warn!("{}: price unavailable via {}: {}", symbol, provider.name(), e);
                0.0
            }
        };
        Some(price)
    })
}

/// Daily closes per symbol; failed or empty series are absent
pub fn fetch_history<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbols: &[Symbol],
    days: u32,
    workers: usize,
) -> HashMap<Symbol, PriceSeries> {
    FetchPool::new(workers).run(symbols, |symbol| match provider.history(symbol, days) {
        Ok(series) if !series.is_empty() => Some(series),
        Ok(_) => {
            log::debug!("{}: empty price history", symbol);
            None
        }
        Err(e) => {
            log::warn!("{}: history unavailable via {}: {}", symbol, provider.name(), e);
            None
        }
    })
}

/// Dividend events per symbol; failed or empty series are absent
pub fn fetch_dividends<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbols: &[Symbol],
    workers: usize,
) -> HashMap<Symbol, Vec<DividendEvent>> {
    FetchPool::new(workers).run(symbols, |symbol| match provider.dividends(symbol) {
        Ok(events) if !events.is_empty() => Some(events),
        Ok(_) => None,
        Err(e) => {
            log::warn!("{}: dividends unavailable via {}: {}", symbol, provider.name(), e);
            None
        }
    })
}

/// Fundamentals for one symbol, `None` when the provider has nothing
pub fn fetch_fundamentals<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
) -> Option<Fundamentals> {
    match provider.fundamentals(symbol) {
        Ok(fundamentals) => Some(fundamentals),
        Err(e) => {
            log::warn!("{}: fundamentals unavailable via {}: {}", symbol, provider.name(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryProvider;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_failures_become_sentinels() {
        let provider = InMemoryProvider::new()
            .with_price("AAA", 10.0)
            .with_price("BBB", f64::NAN)
            .failing("CCC");

        let prices = fetch_last_prices(&provider, &symbols(&["AAA", "BBB", "CCC"]), 5);

        assert_eq!(prices.len(), 3);
        assert_eq!(prices["AAA"], 10.0);
        assert_eq!(prices["BBB"], 0.0);
        assert_eq!(prices["CCC"], 0.0);
    }

    #[test]
    fn test_quote_falls_back_to_history() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let provider = InMemoryProvider::new()
            .with_price("AAA", 0.0)
            .with_close("AAA", date, 9.75);

        assert_eq!(resolve_last_price(&provider, "AAA"), Ok(9.75));
    }

    #[test]
    fn test_absent_series_are_dropped() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let provider = InMemoryProvider::new()
            .with_dividend("AAA", date, 0.5)
            .with_close("AAA", date, 10.0)
            .failing("BBB");
        let all = symbols(&["AAA", "BBB", "CCC"]);

        let dividends = fetch_dividends(&provider, &all, 4);
        assert_eq!(dividends.len(), 1);
        assert!(dividends.contains_key("AAA"));

        let history = fetch_history(&provider, &all, 180, 4);
        assert_eq!(history.len(), 1);
        assert!(history.contains_key("AAA"));
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let pool = FetchPool::new(2);
        let results = pool.run(&symbols(&["OK1", "BOOM", "OK2"]), |symbol| {
            if symbol == "BOOM" {
                panic!("provider exploded");
            }
            Some(symbol.len())
        });

        assert_eq!(results.len(), 2);
        assert_eq!(results["OK1"], 3);
    }

    #[test]
    fn test_every_symbol_runs_once() {
        let calls = AtomicUsize::new(0);
        let names: Vec<Symbol> = (0..20).map(|i| format!("S{}", i)).collect();

        let results = FetchPool::new(4).run(&names, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(())
        });

        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert_eq!(results.len(), 20);
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let pool = FetchPool::new(0);
        assert_eq!(pool.workers, 1);

        let names = vec!["AAA".to_string(), "BBB".to_string()];
        let results = pool.run(&names, |s| Some(s.len()));
        assert_eq!(results.len(), 2);
    }
}
