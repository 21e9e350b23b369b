//! Historical evolution builder
//!
//! Walks every calendar day from the first transaction to `today`, replaying
//! the ledger, and samples {invested capital, market value} on Fridays and
//! on the final day. Market value uses carry-forward ("as-of") prices; when
//! no price is known the invested capital stands in, so the line never
//! collapses to zero.

use crate::calendar::{day_label, days_inclusive, is_friday};
use crate::finance::transaction::Transaction;
use crate::sanitize::sanitize;
use crate::types::{Cash, PriceSeries, Quantity, Symbol};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sample of the evolution chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    /// ISO date of the sample
    pub date: NaiveDate,
    /// `dd/mm/yy`
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "investido")]
    pub invested: Cash,
    #[serde(rename = "patrimonio")]
    pub market_value: Cash,
}

/// Build the weekly + current-day series for the window
/// `[first transaction date, today]`
pub fn build_series(
    transactions: &[Transaction],
    history: &HashMap<Symbol, PriceSeries>,
    today: NaiveDate,
) -> Vec<EvolutionPoint> {
    let Some(start) = transactions.iter().map(|t| t.date).min() else {
        return Vec::new();
    };

    let mut by_day: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for txn in transactions {
        by_day.entry(txn.date).or_default().push(txn);
    }

    let mut quantities: BTreeMap<&str, Quantity> = BTreeMap::new();
    let mut invested: Cash = 0.0;
    let mut points = Vec::new();

    for day in days_inclusive(start, today) {
        if let Some(day_txns) = by_day.get(&day) {
            for txn in day_txns {
                *quantities.entry(txn.symbol.as_str()).or_insert(0.0) += sanitize(&txn.quantity);
                invested += sanitize(&txn.value());
            }
        }

        if invested > 0.0 && (is_friday(day) || day == today) {
            let priced = market_value_as_of(&quantities, history, day);
            let market_value = if priced > 0.0 { priced } else { invested };

            points.push(EvolutionPoint {
                date: day,
                label: day_label(day),
                invested: sanitize(&invested),
                market_value: sanitize(&market_value),
            });
        }
    }

    log::debug!(
        "evolution series from {} to {}: {} points",
        start,
        today,
        points.len()
    );

    points
}

/// Sum of quantity * most recent price on or before `day`, over held symbols
fn market_value_as_of(
    quantities: &BTreeMap<&str, Quantity>,
    history: &HashMap<Symbol, PriceSeries>,
    day: NaiveDate,
) -> Cash {
    quantities
        .iter()
        .filter(|(_, qty)| **qty > 0.0)
        .filter_map(|(symbol, qty)| {
            let price = sanitize(&history.get(*symbol)?.as_of(day));
            (price > 0.0).then(|| qty * price)
        })
        .sum()
}
