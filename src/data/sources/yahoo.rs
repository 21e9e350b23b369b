//! Yahoo Finance data source integration
//!
//! Quotes, daily closes and dividend events come from the chart API;
//! fundamentals from the quoteSummary API. [`YahooFinanceSource`] is async;
//! [`YahooProvider`] wraps it in an owned tokio runtime so the synchronous
//! fetch pools can call it.

use crate::data::MarketDataProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::sanitize::{sanitize, Sanitize};
use crate::types::{DividendEvent, Fundamentals, Price, PriceSeries};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const YAHOO_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,financialData,defaultKeyStatistics,incomeStatementHistory,quoteType";

/// Yahoo Finance data source (no API key required)
pub struct YahooFinanceSource {
    client: Client,
}

impl YahooFinanceSource {
    /// Create a new Yahoo Finance data source
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get_json(&self, url: &str) -> ProviderResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(format!(
                "Yahoo Finance returned error: {}",
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Decode(format!("Failed to read response: {}", e)))
    }

    async fn chart(&self, symbol: &str, query: &str) -> ProviderResult<Value> {
        let url = format!("{}/{}?{}", YAHOO_CHART_URL, symbol, query);
        let body = self.get_json(&url).await?;
        chart_result(symbol, body)
    }

    /// Latest regular-market price
    pub async fn fetch_last_price(&self, symbol: &str) -> ProviderResult<Price> {
        let chart = self.chart(symbol, "range=1d&interval=1d").await?;
        parse_last_price(symbol, &chart)
    }

    /// Daily closes for the last `days` calendar days
    pub async fn fetch_history(&self, symbol: &str, days: u32) -> ProviderResult<PriceSeries> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(days.max(1)));
        let query = format!(
            "period1={}&period2={}&interval=1d",
            start.timestamp(),
            end.timestamp()
        );
        let chart = self.chart(symbol, &query).await?;
        Ok(parse_closes(&chart))
    }

    /// Every dividend event on record
    pub async fn fetch_dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendEvent>> {
        let chart = self.chart(symbol, "range=max&interval=1mo&events=div").await?;
        Ok(parse_dividends(&chart))
    }

    /// Fundamental snapshot
    pub async fn fetch_fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals> {
        let url = format!("{}/{}?modules={}", YAHOO_SUMMARY_URL, symbol, SUMMARY_MODULES);
        let body = self.get_json(&url).await?;
        parse_fundamentals(symbol, &body)
    }
}

/// Blocking facade over [`YahooFinanceSource`]
pub struct YahooProvider {
    source: YahooFinanceSource,
    runtime: tokio::runtime::Runtime,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            source: YahooFinanceSource::new(timeout)?,
            runtime,
        })
    }
}

impl MarketDataProvider for YahooProvider {
    fn last_price(&self, symbol: &str) -> ProviderResult<Price> {
        self.runtime.block_on(self.source.fetch_last_price(symbol))
    }

    fn history(&self, symbol: &str, days: u32) -> ProviderResult<PriceSeries> {
        self.runtime.block_on(self.source.fetch_history(symbol, days))
    }

    fn dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendEvent>> {
        self.runtime.block_on(self.source.fetch_dividends(symbol))
    }

    fn fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals> {
        self.runtime.block_on(self.source.fetch_fundamentals(symbol))
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// `chart.result[0]`, or the API's own error description
fn chart_result(symbol: &str, body: Value) -> ProviderResult<Value> {
    let chart = &body["chart"];
    if let Some(description) = chart["error"]["description"].as_str() {
        return Err(ProviderError::unavailable(symbol, description));
    }
    match &chart["result"][0] {
        Value::Null => Err(ProviderError::NotFound(symbol.to_string())),
        result => Ok(result.clone()),
    }
}

fn parse_last_price(symbol: &str, chart: &Value) -> ProviderResult<Price> {
    let price = sanitize(&chart["meta"]["regularMarketPrice"]);
    if price > 0.0 {
        return Ok(price);
    }
    parse_closes(chart)
        .last_valid()
        .ok_or_else(|| ProviderError::unavailable(symbol, "no price in quote"))
}

/// Exchange timezone declared by the chart metadata
fn exchange_tz(chart: &Value) -> Tz {
    chart["meta"]["exchangeTimezoneName"]
        .as_str()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

/// Calendar date of an epoch timestamp in the exchange's timezone
fn local_date(epoch: i64, tz: Tz) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.with_timezone(&tz).date_naive())
}

fn parse_closes(chart: &Value) -> PriceSeries {
    let tz = exchange_tz(chart);
    let timestamps = chart["timestamp"].as_array().cloned().unwrap_or_default();
    let closes = chart["indicators"]["quote"][0]["close"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut series = PriceSeries::new();
    for (ts, close) in timestamps.iter().zip(closes.iter()) {
        let (Some(epoch), Some(close)) = (ts.as_i64(), close.raw_f64()) else {
            continue;
        };
        if let Some(date) = local_date(epoch, tz) {
            series.insert(date, close);
        }
    }
    series
}

fn parse_dividends(chart: &Value) -> Vec<DividendEvent> {
    let tz = exchange_tz(chart);
    let Some(events) = chart["events"]["dividends"].as_object() else {
        return Vec::new();
    };

    let mut dividends: Vec<DividendEvent> = events
        .values()
        .filter_map(|event| {
            let date = local_date(event["date"].as_i64()?, tz)?;
            Some(DividendEvent::new(date, sanitize(&event["amount"])))
        })
        .collect();
    dividends.sort_by_key(|d| d.date);
    dividends
}

fn optional(value: &Value) -> Option<f64> {
    value.raw_f64().filter(|v| v.is_finite())
}

fn parse_fundamentals(symbol: &str, body: &Value) -> ProviderResult<Fundamentals> {
    let summary = &body["quoteSummary"];
    if let Some(description) = summary["error"]["description"].as_str() {
        return Err(ProviderError::unavailable(symbol, description));
    }
    let result = &summary["result"][0];
    if result.is_null() {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }

    let financial = &result["financialData"];
    let current_price = optional(&financial["currentPrice"])
        .or_else(|| optional(&result["price"]["regularMarketPrice"]));

    let debt_to_ebitda = match (optional(&financial["totalDebt"]), optional(&financial["ebitda"])) {
        (Some(debt), Some(ebitda)) if ebitda != 0.0 => Some(debt / ebitda),
        _ => None,
    };

    let annual_net_income = result["incomeStatementHistory"]["incomeStatementHistory"]
        .as_array()
        .map(|statements| {
            statements
                .iter()
                .filter_map(|s| optional(&s["netIncome"]))
                .collect()
        })
        .unwrap_or_default();

    Ok(Fundamentals {
        current_price,
        first_trade_epoch: result["quoteType"]["firstTradeDateEpochUtc"].as_i64(),
        trailing_eps: optional(&result["defaultKeyStatistics"]["trailingEps"]),
        annual_net_income,
        debt_to_ebitda,
    })
}
