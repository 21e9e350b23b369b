//! Portfolio service
//!
//! Glues a [`LedgerStore`] and a [`MarketDataProvider`] to the analytics
//! engines. Every computation reads a fresh ledger snapshot, fetches what it
//! needs through bounded pools, then runs the pure engines over the merged
//! results.

use crate::config::PortfolioConfig;
use crate::data::{
    fetch_dividends, fetch_fundamentals, fetch_history, fetch_last_prices, resolve_last_price,
    MarketDataProvider,
};
use crate::error::Result;
use crate::finance::dividends::{compute_dividends, DividendReport};
use crate::finance::evolution::{build_series, EvolutionPoint};
use crate::finance::position::{aggregate, timelines};
use crate::finance::scoring::{AssetScore, Scorer};
use crate::finance::transaction::normalize_symbol;
use crate::finance::valuation::{value_portfolio, AssetValuation, PortfolioValuation};
use crate::sanitize::{rounded, sanitize};
use crate::store::LedgerStore;
use crate::types::Symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dashboard payload: headline figures, evolution chart and asset table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(rename = "patrimonio_atual")]
    pub market_value: f64,
    #[serde(rename = "total_investido")]
    pub invested: f64,
    #[serde(rename = "lucro")]
    pub profit: f64,
    #[serde(rename = "rentabilidade_pct")]
    pub profit_pct: f64,
    /// Portfolio-level day change, in percent
    pub daily_variation: f64,
    #[serde(rename = "grafico")]
    pub chart: Vec<EvolutionPoint>,
    #[serde(rename = "ativos")]
    pub assets: Vec<AssetValuation>,
}

impl Dashboard {
    fn from_parts(valuation: PortfolioValuation, chart: Vec<EvolutionPoint>) -> Self {
        Self {
            market_value: rounded(valuation.total_market_value, 2),
            invested: rounded(valuation.total_invested, 2),
            profit: rounded(valuation.profit, 2),
            profit_pct: rounded(valuation.profit_pct, 2),
            daily_variation: rounded(valuation.daily_variation_pct, 2),
            chart,
            assets: valuation.assets,
        }
    }
}

/// Ledger plus market data, composed into the user-facing operations
pub struct PortfolioService<S, P> {
    store: S,
    provider: P,
    config: PortfolioConfig,
    scorer: Scorer,
}

impl<S: LedgerStore, P: MarketDataProvider> PortfolioService<S, P> {
    pub fn new(store: S, provider: P, config: PortfolioConfig) -> Self {
        let scorer = Scorer::new(config.blue_chips.clone());
        Self {
            store,
            provider,
            config,
            scorer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access for ledger edits
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Valuation, evolution chart and asset table as of `today`
    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let transactions = self.store.list_chronological()?;
        if transactions.is_empty() {
            return Ok(Dashboard::default());
        }

        let symbols = distinct_symbols(transactions.iter().map(|t| &t.symbol));
        log::debug!("dashboard: {} transactions over {} symbols", transactions.len(), symbols.len());

        let prices = fetch_last_prices(&self.provider, &symbols, self.config.price_workers);
        let history = fetch_history(
            &self.provider,
            &symbols,
            self.config.history_period_days,
            self.config.price_workers,
        );

        let positions = aggregate(&transactions);
        let valuation = value_portfolio(&positions, &prices, &history, today);
        let chart = build_series(&transactions, &history, today);

        Ok(Dashboard::from_parts(valuation, chart))
    }

    /// Dividend income attributed to the ledger's holdings
    pub fn earnings(&self) -> Result<DividendReport> {
        let transactions = self.store.list_chronological()?;
        if transactions.is_empty() {
            return Ok(DividendReport::default());
        }

        let lines = timelines(&transactions);
        let symbols: Vec<Symbol> = lines.keys().cloned().collect();
        let events = fetch_dividends(&self.provider, &symbols, self.config.dividend_workers);

        Ok(compute_dividends(&lines, &events, &self.config.exchange_suffix))
    }

    /// Score one ticker; unknown or failing tickers yield the default record
    pub fn analyze(&self, ticker: &str, today: NaiveDate) -> AssetScore {
        let display = self.config.display(ticker);
        if display.is_empty() {
            return AssetScore::unavailable(&display);
        }

        let qualified = self.config.qualify(&display);
        match fetch_fundamentals(&self.provider, &qualified) {
            Some(fundamentals) => self.scorer.score(&display, &fundamentals, today),
            None => AssetScore::unavailable(&display),
        }
    }

    /// Latest price of a ticker, rounded to cents; 0.0 when unavailable
    pub fn price_check(&self, ticker: &str) -> f64 {
        let symbol = normalize_symbol(ticker);
        match resolve_last_price(&self.provider, &symbol) {
            Ok(price) => rounded(sanitize(&price), 2),
            Err(e) => {
                log::warn!("{}: price check failed: {}", symbol, e);
                0.0
            }
        }
    }
}

fn distinct_symbols<'a, I>(symbols: I) -> Vec<Symbol>
where
    I: IntoIterator<Item = &'a Symbol>,
{
    symbols
        .into_iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
