//! Position aggregation
//!
//! Folds the ledger into per-symbol positions (for valuation) and into
//! per-symbol dated timelines (for dividend attribution and historical
//! queries). Both are recomputed from scratch on every call.

use crate::finance::transaction::Transaction;
use crate::types::{Cash, Price, Quantity, Symbol};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate holding in a single symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Sum of transaction quantities
    pub total_quantity: Quantity,
    /// Sum of quantity * price
    pub total_cost: Cash,
    /// Class label of the first transaction seen for the symbol
    pub asset_type: String,
}

impl Position {
    /// Create an empty position
    pub fn new(symbol: Symbol, asset_type: String) -> Self {
        Self {
            symbol,
            total_quantity: 0.0,
            total_cost: 0.0,
            asset_type,
        }
    }

    /// Fold one transaction into the position
    pub fn apply(&mut self, txn: &Transaction) {
        self.total_quantity += txn.quantity;
        self.total_cost += txn.value();
    }

    /// Average cost per unit held, 0 when nothing is held
    pub fn average_cost(&self) -> Price {
        if self.total_quantity > 0.0 {
            self.total_cost / self.total_quantity
        } else {
            0.0
        }
    }

    /// Whether the position belongs in current-holdings views
    pub fn is_open(&self) -> bool {
        self.total_quantity > 0.0
    }
}

/// Fold a ledger into per-symbol positions
pub fn aggregate(transactions: &[Transaction]) -> HashMap<Symbol, Position> {
    let mut positions: HashMap<Symbol, Position> = HashMap::new();

    for txn in transactions {
        positions
            .entry(txn.symbol.clone())
            .or_insert_with(|| Position::new(txn.symbol.clone(), txn.asset_type.clone()))
            .apply(txn);
    }

    positions
}

/// Dated transaction history for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub symbol: Symbol,
    pub asset_type: String,
    /// Transactions sorted by date (stable within a day)
    transactions: Vec<Transaction>,
}

impl Timeline {
    fn new(symbol: Symbol, asset_type: String) -> Self {
        Self {
            symbol,
            asset_type,
            transactions: Vec::new(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Date of the earliest transaction
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.transactions.first().map(|t| t.date)
    }

    /// Quantity held from transactions dated strictly before `date`
    pub fn quantity_before(&self, date: NaiveDate) -> Quantity {
        self.transactions
            .iter()
            .take_while(|t| t.date < date)
            .map(|t| t.quantity)
            .sum()
    }

    /// Quantity held at the end of `date`
    pub fn quantity_on(&self, date: NaiveDate) -> Quantity {
        self.transactions
            .iter()
            .take_while(|t| t.date <= date)
            .map(|t| t.quantity)
            .sum()
    }
}

/// Group the ledger into per-symbol timelines, keyed in symbol order
pub fn timelines(transactions: &[Transaction]) -> BTreeMap<Symbol, Timeline> {
    let mut grouped: BTreeMap<Symbol, Timeline> = BTreeMap::new();

    for txn in transactions {
        grouped
            .entry(txn.symbol.clone())
            .or_insert_with(|| Timeline::new(txn.symbol.clone(), txn.asset_type.clone()))
            .transactions
            .push(txn.clone());
    }

    for timeline in grouped.values_mut() {
        timeline.transactions.sort_by_key(|t| t.date);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::transaction::NewTransaction;

    fn txn(id: i64, symbol: &str, ymd: (i32, u32, u32), qty: f64, price: f64, kind: &str) -> Transaction {
        let date = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap();
        Transaction::from_new(id, NewTransaction::new(symbol, date, qty, price, kind))
    }

    #[test]
    fn test_aggregate_folds_quantity_and_cost() {
        let ledger = vec![
            txn(1, "AAA", (2023, 1, 10), 100.0, 10.0, "Ação"),
            txn(2, "AAA", (2023, 2, 10), 50.0, 13.0, "Ação"),
            txn(3, "BBB", (2023, 1, 11), 10.0, 100.0, "FII"),
        ];

        let positions = aggregate(&ledger);
        assert_eq!(positions.len(), 2);

        let aaa = &positions["AAA"];
        assert_eq!(aaa.total_quantity, 150.0);
        assert_eq!(aaa.total_cost, 1650.0);
        assert_eq!(aaa.average_cost(), 11.0);
        assert_eq!(aaa.asset_type, "Ação");
        assert_eq!(positions["BBB"].asset_type, "FII");
    }

    #[test]
    fn test_first_asset_type_wins() {
        let ledger = vec![
            txn(1, "AAA", (2023, 1, 10), 1.0, 10.0, "Ação"),
            txn(2, "AAA", (2023, 1, 11), 1.0, 10.0, "FII"),
        ];
        assert_eq!(aggregate(&ledger)["AAA"].asset_type, "Ação");
    }

    #[test]
    fn test_closed_position_is_not_open() {
        let ledger = vec![
            txn(1, "AAA", (2023, 1, 10), 10.0, 10.0, "Ação"),
            txn(2, "AAA", (2023, 3, 10), -10.0, 12.0, "Ação"),
        ];

        let position = &aggregate(&ledger)["AAA"];
        assert!(!position.is_open());
        assert_eq!(position.average_cost(), 0.0);
    }

    #[test]
    fn test_empty_ledger() {
        assert!(aggregate(&[]).is_empty());
        assert!(timelines(&[]).is_empty());
    }

    #[test]
    fn test_timeline_windows() {
        let ledger = vec![
            txn(2, "AAA", (2023, 2, 1), 30.0, 10.0, "Ação"),
            txn(1, "AAA", (2023, 1, 1), 20.0, 10.0, "Ação"),
        ];
        let grouped = timelines(&ledger);
        let timeline = &grouped["AAA"];

        let feb1 = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(timeline.first_date(), NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(timeline.quantity_before(feb1), 20.0);
        assert_eq!(timeline.quantity_on(feb1), 50.0);
        assert_eq!(timeline.transactions()[0].id, 1);
    }
}
