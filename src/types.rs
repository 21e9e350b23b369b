//! Core types shared by the engines and the market-data layer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticker symbol (uppercased)
pub type Symbol = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Quantity/volume type
pub type Quantity = f64;

/// Money/cash type
pub type Cash = f64;

/// Daily close prices for one symbol, ordered by date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    closes: BTreeMap<NaiveDate, Price>,
}

impl PriceSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from (date, close) pairs. Later duplicates win.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Price)>,
    {
        Self {
            closes: points.into_iter().collect(),
        }
    }

    /// Record the close for a date
    pub fn insert(&mut self, date: NaiveDate, close: Price) {
        self.closes.insert(date, close);
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Iterate over (date, close) in date order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, Price)> + '_ {
        self.closes.iter().map(|(d, p)| (*d, *p))
    }

    /// First close in the series, valid or not
    pub fn first_close(&self) -> Option<Price> {
        self.closes.values().next().copied()
    }

    /// Most recent valid close on or before `date`
    pub fn as_of(&self, date: NaiveDate) -> Option<Price> {
        self.closes
            .range(..=date)
            .rev()
            .map(|(_, p)| *p)
            .find(|p| is_valid_close(*p))
    }

    /// Most recent valid close in the series
    pub fn last_valid(&self) -> Option<Price> {
        self.closes.values().rev().copied().find(|p| is_valid_close(*p))
    }

    /// The last two valid closes as `(previous, last)`
    pub fn last_two_valid(&self) -> Option<(Price, Price)> {
        let mut valid = self.closes.values().rev().copied().filter(|p| is_valid_close(*p));
        let last = valid.next()?;
        let prev = valid.next()?;
        Some((prev, last))
    }
}

fn is_valid_close(price: Price) -> bool {
    price.is_finite() && price > 0.0
}

/// A dividend paid per share, keyed by its ex-date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

impl DividendEvent {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Fundamental snapshot for one symbol. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub current_price: Option<f64>,
    /// First trade, seconds since the Unix epoch
    pub first_trade_epoch: Option<i64>,
    pub trailing_eps: Option<f64>,
    /// Annual net income, most recent first. Missing years are simply absent.
    pub annual_net_income: Vec<f64>,
    pub debt_to_ebitda: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_as_of_carries_forward() {
        let series = PriceSeries::from_points(vec![
            (d(2024, 1, 2), 10.0),
            (d(2024, 1, 5), 11.0),
        ]);

        assert_eq!(series.as_of(d(2024, 1, 1)), None);
        assert_eq!(series.as_of(d(2024, 1, 2)), Some(10.0));
        assert_eq!(series.as_of(d(2024, 1, 4)), Some(10.0));
        assert_eq!(series.as_of(d(2024, 2, 1)), Some(11.0));
    }

    #[test]
    fn test_as_of_skips_missing_closes() {
        let series = PriceSeries::from_points(vec![
            (d(2024, 1, 2), 10.0),
            (d(2024, 1, 3), f64::NAN),
        ]);

        assert_eq!(series.as_of(d(2024, 1, 3)), Some(10.0));
        assert_eq!(series.last_valid(), Some(10.0));
    }

    #[test]
    fn test_last_two_valid() {
        let series = PriceSeries::from_points(vec![
            (d(2024, 1, 2), 10.0),
            (d(2024, 1, 3), 12.0),
            (d(2024, 1, 4), f64::NAN),
        ]);
        assert_eq!(series.last_two_valid(), Some((10.0, 12.0)));

        let single = PriceSeries::from_points(vec![(d(2024, 1, 2), 10.0)]);
        assert_eq!(single.last_two_valid(), None);
    }
}
