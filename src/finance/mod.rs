//! Finance module - ledger entries, positions and the analytics engines

pub mod dividends;
pub mod evolution;
pub mod position;
pub mod scoring;
pub mod transaction;
pub mod valuation;

pub use dividends::{compute_dividends, DividendDetail, DividendReport, MonthlyDividends, NamedAmount};
pub use evolution::{build_series, EvolutionPoint};
pub use position::{aggregate, timelines, Position, Timeline};
pub use scoring::{AssetScore, Criteria, Scorer, Status, Verdict, DEFAULT_BLUE_CHIPS};
pub use transaction::{NewTransaction, Transaction, TransactionId};
pub use valuation::{value_portfolio, value_position, AssetValuation, PortfolioValuation};
