//! Valuation engine
//!
//! Turns aggregated positions plus externally fetched prices into a
//! portfolio snapshot: market value, average cost, unrealized return and the
//! day's variation per asset and in aggregate.

use crate::calendar::is_weekend;
use crate::finance::position::Position;
use crate::sanitize::sanitize;
use crate::types::{Cash, Price, PriceSeries, Quantity, Symbol};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Valuation of one open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetValuation {
    #[serde(rename = "ticker")]
    pub symbol: Symbol,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(rename = "qtd")]
    pub quantity: Quantity,
    /// Average cost per unit
    #[serde(rename = "pm")]
    pub average_cost: Price,
    /// Price used for valuation (falls back to average cost)
    #[serde(rename = "atual")]
    pub current_price: Price,
    #[serde(rename = "total")]
    pub market_value: Cash,
    /// Unrealized return, in percent
    #[serde(rename = "rentabilidade")]
    pub return_pct: f64,
    /// Day-over-day price change, in percent
    #[serde(rename = "variacao_diaria")]
    pub daily_variation_pct: f64,
    #[serde(skip)]
    pub daily_variation_money: Cash,
}

/// Aggregate snapshot of all open positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    /// Open positions, by market value descending
    pub assets: Vec<AssetValuation>,
    pub total_market_value: Cash,
    pub total_invested: Cash,
    pub profit: Cash,
    pub profit_pct: f64,
    pub daily_variation_money: Cash,
    pub daily_variation_pct: f64,
}

/// Percentage change between the last two valid closes, 0 when unknown
pub fn daily_variation_pct(series: Option<&PriceSeries>) -> f64 {
    let Some((prev, last)) = series.and_then(PriceSeries::last_two_valid) else {
        return 0.0;
    };
    let prev = sanitize(&prev);
    let last = sanitize(&last);
    if prev > 0.0 {
        sanitize(&((last - prev) / prev * 100.0))
    } else {
        0.0
    }
}

/// Money equivalent of a percentage move that ended at `market_value`
fn money_variation(market_value: Cash, variation_pct: f64) -> Cash {
    sanitize(&(market_value - market_value / (1.0 + variation_pct / 100.0)))
}

/// Value a single open position
pub fn value_position(
    position: &Position,
    last_price: Price,
    series: Option<&PriceSeries>,
    variation_enabled: bool,
) -> AssetValuation {
    let quantity = sanitize(&position.total_quantity);
    let average_cost = sanitize(&position.average_cost());

    let mut current_price = sanitize(&last_price);
    if current_price == 0.0 {
        current_price = average_cost;
    }

    let market_value = sanitize(&(quantity * current_price));
    let return_pct = if average_cost > 0.0 {
        sanitize(&((current_price - average_cost) / average_cost * 100.0))
    } else {
        0.0
    };

    let daily_variation_pct = if variation_enabled {
        daily_variation_pct(series)
    } else {
        0.0
    };

    AssetValuation {
        symbol: position.symbol.clone(),
        asset_type: position.asset_type.clone(),
        quantity,
        average_cost,
        current_price,
        market_value,
        return_pct,
        daily_variation_pct,
        daily_variation_money: money_variation(market_value, daily_variation_pct),
    }
}

/// Value every open position and aggregate the results
///
/// `prices` holds last-trade prices (0.0 or missing means unavailable),
/// `history` holds daily closes per symbol. Variation is zero on weekends
/// and for symbols without a series.
pub fn value_portfolio(
    positions: &HashMap<Symbol, Position>,
    prices: &HashMap<Symbol, Price>,
    history: &HashMap<Symbol, PriceSeries>,
    today: NaiveDate,
) -> PortfolioValuation {
    let variation_enabled = !is_weekend(today) && !history.is_empty();

    let mut assets: Vec<AssetValuation> = positions
        .values()
        .filter(|p| p.is_open())
        .map(|p| {
            let price = prices.get(&p.symbol).copied().unwrap_or(0.0);
            value_position(p, price, history.get(&p.symbol), variation_enabled)
        })
        .collect();

    assets.sort_by(|a, b| {
        b.market_value
            .total_cmp(&a.market_value)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let total_market_value: Cash = assets.iter().map(|a| a.market_value).sum();
    let total_invested: Cash = positions
        .values()
        .filter(|p| p.is_open())
        .map(|p| sanitize(&p.total_cost))
        .sum();
    let daily_variation_money: Cash = assets.iter().map(|a| a.daily_variation_money).sum();

    let profit = total_market_value - total_invested;
    let profit_pct = if total_invested > 0.0 {
        profit / total_invested * 100.0
    } else {
        0.0
    };

    let previous_value = total_market_value - daily_variation_money;
    let daily_variation_pct = if previous_value > 0.0 {
        daily_variation_money / previous_value * 100.0
    } else {
        0.0
    };

    log::debug!(
        "valued {} open positions: market value {:.2}, invested {:.2}",
        assets.len(),
        total_market_value,
        total_invested
    );

    PortfolioValuation {
        assets,
        total_market_value: sanitize(&total_market_value),
        total_invested: sanitize(&total_invested),
        profit: sanitize(&profit),
        profit_pct: sanitize(&profit_pct),
        daily_variation_money: sanitize(&daily_variation_money),
        daily_variation_pct: sanitize(&daily_variation_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::position::aggregate;
    use crate::finance::transaction::{NewTransaction, Transaction};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(id: i64, symbol: &str, qty: f64, price: f64) -> Transaction {
        Transaction::from_new(id, NewTransaction::new(symbol, d(2023, 1, 10), qty, price, "Ação"))
    }

    // 2023-03-15 is a Wednesday
    const WEDNESDAY: (i32, u32, u32) = (2023, 3, 15);

    fn wednesday() -> NaiveDate {
        d(WEDNESDAY.0, WEDNESDAY.1, WEDNESDAY.2)
    }

    #[test]
    fn test_single_asset_without_history() {
        let positions = aggregate(&[txn(1, "AAA", 100.0, 10.0)]);
        let prices: HashMap<_, _> = [("AAA".to_string(), 12.0)].into_iter().collect();

        let valuation = value_portfolio(&positions, &prices, &HashMap::new(), wednesday());
        let asset = &valuation.assets[0];

        assert_relative_eq!(asset.average_cost, 10.0);
        assert_relative_eq!(asset.current_price, 12.0);
        assert_relative_eq!(asset.market_value, 1200.0);
        assert_relative_eq!(asset.return_pct, 20.0, epsilon = 1e-9);
        assert_eq!(asset.daily_variation_pct, 0.0);

        assert_relative_eq!(valuation.total_market_value, 1200.0);
        assert_relative_eq!(valuation.total_invested, 1000.0);
        assert_relative_eq!(valuation.profit, 200.0);
        assert_relative_eq!(valuation.profit_pct, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_price_falls_back_to_average_cost() {
        let positions = aggregate(&[txn(1, "AAA", 10.0, 25.0)]);
        let prices: HashMap<_, _> = [("AAA".to_string(), f64::NAN)].into_iter().collect();

        let valuation = value_portfolio(&positions, &prices, &HashMap::new(), wednesday());

        assert_eq!(valuation.assets[0].current_price, 25.0);
        assert_eq!(valuation.assets[0].return_pct, 0.0);
        assert_eq!(valuation.profit, 0.0);
    }

    #[test]
    fn test_daily_variation_from_history() {
        let positions = aggregate(&[txn(1, "AAA", 10.0, 10.0)]);
        let prices: HashMap<_, _> = [("AAA".to_string(), 11.0)].into_iter().collect();
        let series = PriceSeries::from_points(vec![(d(2023, 3, 13), 10.0), (d(2023, 3, 14), 11.0)]);
        let history: HashMap<_, _> = [("AAA".to_string(), series)].into_iter().collect();

        let valuation = value_portfolio(&positions, &prices, &history, wednesday());
        let asset = &valuation.assets[0];

        assert_relative_eq!(asset.daily_variation_pct, 10.0, epsilon = 1e-9);
        // 110 today, 100 yesterday
        assert_relative_eq!(asset.daily_variation_money, 10.0, epsilon = 1e-9);
        assert_relative_eq!(valuation.daily_variation_money, 10.0, epsilon = 1e-9);
        assert_relative_eq!(valuation.daily_variation_pct, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_variation_on_weekend() {
        let positions = aggregate(&[txn(1, "AAA", 10.0, 10.0)]);
        let series = PriceSeries::from_points(vec![(d(2023, 3, 16), 10.0), (d(2023, 3, 17), 11.0)]);
        let history: HashMap<_, _> = [("AAA".to_string(), series)].into_iter().collect();

        let saturday = d(2023, 3, 18);
        let valuation = value_portfolio(&positions, &HashMap::new(), &history, saturday);

        assert_eq!(valuation.assets[0].daily_variation_pct, 0.0);
        assert_eq!(valuation.daily_variation_pct, 0.0);
    }

    #[test]
    fn test_non_positive_previous_close_is_ignored() {
        let series = PriceSeries::from_points(vec![(d(2023, 3, 13), 0.0), (d(2023, 3, 14), 11.0)]);
        assert_eq!(daily_variation_pct(Some(&series)), 0.0);
        assert_eq!(daily_variation_pct(None), 0.0);
    }

    #[test]
    fn test_trailing_zero_close_is_skipped() {
        let positions = aggregate(&[txn(1, "AAA", 10.0, 10.0)]);
        let prices: HashMap<_, _> = [("AAA".to_string(), 10.0)].into_iter().collect();
        let series = PriceSeries::from_points(vec![
            (d(2023, 3, 10), 8.0),
            (d(2023, 3, 13), 10.0),
            (d(2023, 3, 14), 0.0),
        ]);
        let history: HashMap<_, _> = [("AAA".to_string(), series)].into_iter().collect();

        let valuation = value_portfolio(&positions, &prices, &history, wednesday());
        let asset = &valuation.assets[0];

        // 8 -> 10, the zero close is a missing quote
        assert_relative_eq!(asset.daily_variation_pct, 25.0, epsilon = 1e-9);
        assert_relative_eq!(asset.daily_variation_money, 20.0, epsilon = 1e-9);
        assert_relative_eq!(valuation.daily_variation_money, 20.0, epsilon = 1e-9);
        assert_relative_eq!(valuation.daily_variation_pct, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_valid_close_has_no_variation() {
        let series = PriceSeries::from_points(vec![(d(2023, 3, 13), 10.0), (d(2023, 3, 14), 0.0)]);
        assert_eq!(series.last_two_valid(), None);
        assert_eq!(daily_variation_pct(Some(&series)), 0.0);
    }

    #[test]
    fn test_sorted_by_market_value_and_closed_positions_skipped() {
        let ledger = vec![
            txn(1, "SMALL", 1.0, 10.0),
            txn(2, "BIG", 100.0, 10.0),
            txn(3, "GONE", 5.0, 10.0),
            txn(4, "GONE", -5.0, 12.0),
        ];
        let positions = aggregate(&ledger);

        let valuation = value_portfolio(&positions, &HashMap::new(), &HashMap::new(), wednesday());
        let symbols: Vec<_> = valuation.assets.iter().map(|a| a.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["BIG", "SMALL"]);
        assert_relative_eq!(valuation.total_invested, 1010.0);
    }

    #[test]
    fn test_empty_positions() {
        let valuation = value_portfolio(&HashMap::new(), &HashMap::new(), &HashMap::new(), wednesday());
        assert_eq!(valuation, PortfolioValuation::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let positions = aggregate(&[txn(1, "AAA", 100.0, 10.0)]);
        let valuation = value_portfolio(&positions, &HashMap::new(), &HashMap::new(), wednesday());
        let json = serde_json::to_value(&valuation.assets[0]).unwrap();

        for key in ["ticker", "type", "qtd", "pm", "atual", "total", "rentabilidade", "variacao_diaria"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json.get("daily_variation_money").is_none());
    }
}
