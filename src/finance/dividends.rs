//! Dividend engine
//!
//! Attributes each dividend event to the quantity held before its ex-date
//! and aggregates the payments by month, by symbol and by asset class.

use crate::calendar::{month_key, month_label};
use crate::finance::position::Timeline;
use crate::finance::transaction::display_symbol;
use crate::sanitize::sanitize;
use crate::types::{Cash, DividendEvent, Symbol};
use chrono::{Datelike, NaiveDate};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Income received in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDividends {
    /// `Mon/yy`, e.g. `Feb/23`
    #[serde(rename = "mes")]
    pub label: String,
    pub total: Cash,
    /// Breakdown by asset class, flattened into the record. Class labels
    /// that clash with the fixed keys get a trailing `_`, see [`column_key`].
    #[serde(flatten)]
    pub by_type: BTreeMap<String, Cash>,
}

/// A named amount (by symbol or by class)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedAmount {
    pub name: String,
    pub value: Cash,
}

/// One attributed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendDetail {
    pub date: NaiveDate,
    /// Display form, without the exchange suffix
    pub ticker: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(rename = "val")]
    pub amount: Cash,
}

/// Dividend income breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendReport {
    #[serde(rename = "total_acumulado")]
    pub total: Cash,
    /// Chronological
    #[serde(rename = "historico_mensal")]
    pub monthly: Vec<MonthlyDividends>,
    /// Amount descending
    #[serde(rename = "por_ativo")]
    pub by_symbol: Vec<NamedAmount>,
    /// Amount descending
    #[serde(rename = "por_classe")]
    pub by_class: Vec<NamedAmount>,
    /// Date ascending
    #[serde(rename = "detalhes")]
    pub details: Vec<DividendDetail>,
}

#[derive(Default)]
struct MonthBucket {
    first_day: Option<NaiveDate>,
    total: Cash,
    by_type: BTreeMap<String, Cash>,
}

/// Attribute and aggregate dividend income
///
/// Symbols without a series (or with an empty one) are skipped. Only events
/// on or after the first purchase count, and only shares bought strictly
/// before the ex-date qualify.
pub fn compute_dividends(
    timelines: &BTreeMap<Symbol, Timeline>,
    series: &HashMap<Symbol, Vec<DividendEvent>>,
    exchange_suffix: &str,
) -> DividendReport {
    let mut total: Cash = 0.0;
    let mut months: BTreeMap<String, MonthBucket> = BTreeMap::new();
    let mut by_symbol: Vec<NamedAmount> = Vec::new();
    let mut by_class: BTreeMap<String, Cash> = BTreeMap::new();
    let mut details: Vec<DividendDetail> = Vec::new();

    for (symbol, timeline) in timelines {
        let Some(events) = series.get(symbol).filter(|e| !e.is_empty()) else {
            continue;
        };
        let Some(first_buy) = timeline.first_date() else {
            continue;
        };

        let mut events: Vec<DividendEvent> = events
            .iter()
            .copied()
            .filter(|e| e.date >= first_buy)
            .collect();
        events.sort_by_key(|e| e.date);

        let ticker = display_symbol(symbol, exchange_suffix);
        let asset_type = &timeline.asset_type;
        let mut symbol_total: Cash = 0.0;

        for event in events {
            let held = sanitize(&timeline.quantity_before(event.date));
            if held <= 0.0 {
                continue;
            }

            let payment = sanitize(&(held * sanitize(&event.amount)));
            symbol_total += payment;
            total += payment;

            let bucket = months.entry(month_key(event.date)).or_default();
            bucket.first_day.get_or_insert_with(|| first_of_month(event.date));
            bucket.total += payment;
            *bucket.by_type.entry(column_key(asset_type)).or_insert(0.0) += payment;

            details.push(DividendDetail {
                date: event.date,
                ticker: ticker.clone(),
                asset_type: asset_type.clone(),
                amount: payment,
            });
        }

        if symbol_total > 0.0 {
            by_symbol.push(NamedAmount {
                name: ticker,
                value: sanitize(&symbol_total),
            });
            *by_class.entry(asset_type.clone()).or_insert(0.0) += symbol_total;
        }
    }

    details.sort_by_key(|d| d.date);
    by_symbol.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut by_class: Vec<NamedAmount> = by_class
        .into_iter()
        .map(|(name, value)| NamedAmount {
            name,
            value: sanitize(&value),
        })
        .collect();
    by_class.sort_by(|a, b| b.value.total_cmp(&a.value));

    let monthly = months
        .into_values()
        .filter_map(|bucket| {
            let first_day = bucket.first_day?;
            Some(MonthlyDividends {
                label: month_label(first_day),
                total: sanitize(&bucket.total),
                by_type: bucket
                    .by_type
                    .into_iter()
                    .map(|(k, v)| (k, sanitize(&v)))
                    .collect(),
            })
        })
        .collect();

    log::debug!(
        "dividends: {:.2} over {} payments from {} symbols",
        total,
        details.len(),
        by_symbol.len()
    );

    DividendReport {
        total: sanitize(&total),
        monthly,
        by_symbol,
        by_class,
        details,
    }
}

/// Fixed keys of a serialized [`MonthlyDividends`]
const MONTH_KEYS: &[&str] = &["mes", "total"];

/// Per-class column name inside a monthly record
///
/// Appends `_` until the label no longer collides with a fixed key, so a
/// class called `total` becomes `total_`.
pub fn column_key(asset_type: &str) -> String {
    let mut key = asset_type.to_string();
    while MONTH_KEYS.contains(&key.as_str()) {
        key.push('_');
    }
    key
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::position::timelines;
    use crate::finance::transaction::{NewTransaction, Transaction};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(id: i64, symbol: &str, date: NaiveDate, qty: f64, kind: &str) -> Transaction {
        Transaction::from_new(id, NewTransaction::new(symbol, date, qty, 5.0, kind))
    }

    fn series_of(entries: Vec<(&str, Vec<DividendEvent>)>) -> HashMap<Symbol, Vec<DividendEvent>> {
        entries.into_iter().map(|(s, e)| (s.to_string(), e)).collect()
    }

    #[test]
    fn test_single_payment() {
        let ledger = vec![txn(1, "BBB", d(2023, 1, 1), 50.0, "Ação")];
        let series = series_of(vec![("BBB", vec![DividendEvent::new(d(2023, 2, 1), 1.0)])]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");

        assert_relative_eq!(report.total, 50.0);
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].label, "Feb/23");
        assert_relative_eq!(report.monthly[0].total, 50.0);
        assert_relative_eq!(report.monthly[0].by_type["Ação"], 50.0);
        assert_eq!(report.details.len(), 1);
        assert_relative_eq!(report.details[0].amount, 50.0);
    }

    #[test]
    fn test_same_day_purchase_does_not_qualify() {
        let ledger = vec![
            txn(1, "BBB", d(2023, 1, 1), 50.0, "Ação"),
            txn(2, "BBB", d(2023, 2, 1), 100.0, "Ação"),
        ];
        let series = series_of(vec![("BBB", vec![DividendEvent::new(d(2023, 2, 1), 1.0)])]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");
        assert_relative_eq!(report.total, 50.0);
    }

    #[test]
    fn test_events_before_first_purchase_are_ignored() {
        let ledger = vec![txn(1, "BBB", d(2023, 1, 1), 50.0, "Ação")];
        let series = series_of(vec![(
            "BBB",
            vec![
                DividendEvent::new(d(2022, 12, 1), 1.0),
                DividendEvent::new(d(2023, 1, 1), 1.0),
            ],
        )]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");
        assert_eq!(report.total, 0.0);
        assert!(report.by_symbol.is_empty());
        assert!(report.monthly.is_empty());
    }

    #[test]
    fn test_aggregations_and_ordering() {
        let ledger = vec![
            txn(1, "PETR4.SA", d(2023, 1, 1), 100.0, "Ação"),
            txn(2, "HGLG11.SA", d(2023, 1, 1), 10.0, "FII"),
            txn(3, "ITSA4.SA", d(2023, 1, 1), 10.0, "Ação"),
        ];
        let series = series_of(vec![
            (
                "PETR4.SA",
                vec![
                    DividendEvent::new(d(2023, 3, 10), 0.5),
                    DividendEvent::new(d(2023, 2, 10), 1.0),
                ],
            ),
            ("HGLG11.SA", vec![DividendEvent::new(d(2023, 2, 15), 1.1)]),
            ("ITSA4.SA", vec![]),
        ]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");

        assert_relative_eq!(report.total, 100.0 + 50.0 + 11.0, epsilon = 1e-9);

        let months: Vec<_> = report.monthly.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(months, vec!["Feb/23", "Mar/23"]);
        assert_relative_eq!(report.monthly[0].total, 111.0, epsilon = 1e-9);
        assert_relative_eq!(report.monthly[0].by_type["FII"], 11.0, epsilon = 1e-9);
        assert_relative_eq!(report.monthly[0].by_type["Ação"], 100.0);

        assert_eq!(report.by_symbol[0].name, "PETR4");
        assert_eq!(report.by_symbol[1].name, "HGLG11");
        assert_eq!(report.by_class[0].name, "Ação");
        assert_relative_eq!(report.by_class[1].value, 11.0, epsilon = 1e-9);

        let dates: Vec<_> = report.details.iter().map(|x| x.date).collect();
        assert_eq!(dates, vec![d(2023, 2, 10), d(2023, 2, 15), d(2023, 3, 10)]);
        assert_eq!(report.details[0].ticker, "PETR4");
    }

    #[test]
    fn test_sold_out_position_receives_nothing() {
        let ledger = vec![
            txn(1, "BBB", d(2023, 1, 1), 50.0, "Ação"),
            txn(2, "BBB", d(2023, 1, 20), -50.0, "Ação"),
        ];
        let series = series_of(vec![("BBB", vec![DividendEvent::new(d(2023, 2, 1), 1.0)])]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");
        assert_eq!(report.total, 0.0);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_monthly_serializes_flat() {
        let ledger = vec![txn(1, "BBB", d(2023, 1, 1), 50.0, "FII")];
        let series = series_of(vec![("BBB", vec![DividendEvent::new(d(2023, 2, 1), 1.0)])]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["historico_mensal"][0]["mes"], "Feb/23");
        assert_eq!(json["historico_mensal"][0]["FII"], 50.0);
        assert_eq!(json["total_acumulado"], 50.0);
    }

    #[test]
    fn test_class_named_like_fixed_key_keeps_json_unique() {
        let ledger = vec![
            txn(1, "BBB", d(2023, 1, 1), 50.0, "total"),
            txn(2, "CCC", d(2023, 1, 1), 10.0, "mes"),
        ];
        let series = series_of(vec![
            ("BBB", vec![DividendEvent::new(d(2023, 2, 1), 1.0)]),
            ("CCC", vec![DividendEvent::new(d(2023, 2, 1), 0.5)]),
        ]);

        let report = compute_dividends(&timelines(&ledger), &series, ".SA");
        let text = serde_json::to_string(&report.monthly[0]).unwrap();

        assert_eq!(text.matches("\"total\":").count(), 1);
        assert_eq!(text.matches("\"mes\":").count(), 1);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["mes"], "Feb/23");
        assert_eq!(json["total"], 55.0);
        assert_eq!(json["total_"], 50.0);
        assert_eq!(json["mes_"], 5.0);

        // details and class totals keep the label as entered
        assert!(report.details.iter().any(|d| d.asset_type == "total"));
        assert_eq!(report.by_class[0].name, "total");
    }

    #[test]
    fn test_column_key() {
        assert_eq!(column_key("FII"), "FII");
        assert_eq!(column_key("total"), "total_");
        assert_eq!(column_key("mes"), "mes_");
    }

    #[test]
    fn test_empty_inputs() {
        let report = compute_dividends(&BTreeMap::new(), &HashMap::new(), ".SA");
        assert_eq!(report, DividendReport::default());
    }
}
