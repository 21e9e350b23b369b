//! # Rusty-Portfolio
//!
//! A personal investment portfolio tracker.
//!
//! A ledger of buy/sell transactions is combined with externally fetched
//! market data to produce a valuation snapshot, a weekly evolution chart,
//! dividend income attribution and a fundamentals-based score per asset.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rusty_portfolio::prelude::*;
//! use chrono::NaiveDate;
//!
//! let mut ledger = InMemoryLedger::new();
//! let date = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
//! ledger.insert(NewTransaction::new("petr4.sa", date, 100.0, 25.0, "Ação")).unwrap();
//!
//! let provider = InMemoryProvider::new().with_price("PETR4.SA", 30.0);
//! let service = PortfolioService::new(ledger, provider, PortfolioConfig::default());
//!
//! let dashboard = service.dashboard(date).unwrap();
//! println!("{}", dashboard.market_value);
//! ```

pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod finance;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::PortfolioConfig;
    pub use crate::data::{InMemoryProvider, MarketDataProvider};
    pub use crate::error::{PortfolioError, ProviderError, Result};
    pub use crate::finance::{
        AssetScore, AssetValuation, DividendReport, EvolutionPoint, NewTransaction,
        PortfolioValuation, Position, Transaction, Verdict,
    };
    pub use crate::sanitize::{sanitize, Sanitize};
    pub use crate::service::{Dashboard, PortfolioService};
    pub use crate::store::{InMemoryLedger, LedgerStore};
    #[cfg(feature = "rusqlite-support")]
    pub use crate::store::SqliteLedger;
    pub use crate::types::*;
}
