//! Asset scoring ("Raio-X")
//!
//! A fixed rubric over one symbol's fundamental snapshot. Four criteria
//! each contribute 0-2 points:
//!
//! | Criterion     | GREEN (2)              | YELLOW (1)   | RED (0)          |
//! |---------------|------------------------|--------------|------------------|
//! | Listing age   | >= 7 years             | >= 5 years   | < 5 years        |
//! | Profitability | every reported year > 0|              | any year <= 0    |
//! | Leverage      | debt/EBITDA <= 2       | <= 3         | > 3              |
//! | Governance    | common shares (ON)     | preferred    |                  |
//!
//! A criterion whose input is missing is reported as GRAY and scores the
//! rubric's default for unknown data (listing age: 5 years, leverage: low,
//! profitability: nothing). Scoring never fails.

use crate::calendar::years_between;
use crate::sanitize::{rounded, sanitize};
use crate::types::Fundamentals;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Large, established tickers that always pass the listing-age criterion
pub const DEFAULT_BLUE_CHIPS: &[&str] = &[
    "VALE3", "PETR4", "PETR3", "ITUB4", "BBDC4", "BBDC3", "BBAS3", "ABEV3", "WEGE3", "EGIE3",
    "ITSA4", "SANB11", "GGBR4", "GOAU4", "CMIG4", "ELET3", "ELET6", "CSNA3", "RADL3", "VIVT3",
    "TIMS3", "CSMG3", "SBSP3", "CPLE6", "TAEE11", "KLBN11", "VULC3", "LEVE3", "TUPY3", "PRIO3",
    "POMO4", "SAPR11", "TRPL4", "FLRY3", "RENT3", "LREN3", "JBSS3", "BRFS3", "MGLU3",
];

/// Listing age assumed for blue chips
const BLUE_CHIP_YEARS: f64 = 20.0;
/// Listing age assumed when the first trade date is unknown
const UNKNOWN_LISTING_YEARS: f64 = 5.0;

/// Traffic-light status of a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Green,
    Yellow,
    Red,
    /// Input missing
    Gray,
}

/// Overall classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// No fundamentals could be fetched
    #[serde(rename = "Indisponível")]
    Unavailable,
    /// At least one disqualifying criterion
    #[serde(rename = "Mamute Vermelho")]
    Red,
    /// Top tier
    #[serde(rename = "Mamute Azul")]
    Blue,
    /// Middle tier
    #[serde(rename = "Mamute Amarelo")]
    Yellow,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Unavailable => write!(f, "Indisponível"),
            Verdict::Red => write!(f, "Mamute Vermelho"),
            Verdict::Blue => write!(f, "Mamute Azul"),
            Verdict::Yellow => write!(f, "Mamute Amarelo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitCriterion {
    pub status: Status,
    /// Years of net income available
    pub years: usize,
    /// Profitable years counted (all of them when GREEN, else 0)
    pub profitable: usize,
    #[serde(skip)]
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceCriterion {
    pub status: Status,
    /// "ON", "PN" or "N/A"
    #[serde(rename = "type")]
    pub share_class: String,
    #[serde(skip)]
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtCriterion {
    pub status: Status,
    /// Debt/EBITDA, 0 when unknown
    pub current_ratio: f64,
    #[serde(skip)]
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoCriterion {
    pub status: Status,
    pub years: f64,
    #[serde(skip)]
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub profit: ProfitCriterion,
    pub governance: GovernanceCriterion,
    pub debt: DebtCriterion,
    pub ipo: IpoCriterion,
}

/// Scoring result for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetScore {
    /// Display ticker (no exchange suffix)
    pub ticker: String,
    pub price: f64,
    pub score: u8,
    pub verdict: Verdict,
    pub criteria: Criteria,
}

impl AssetScore {
    /// The record returned when nothing is known about the symbol
    pub fn unavailable(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            price: 0.0,
            score: 0,
            verdict: Verdict::Unavailable,
            criteria: Criteria {
                profit: ProfitCriterion {
                    status: Status::Gray,
                    years: 0,
                    profitable: 0,
                    points: 0,
                },
                governance: GovernanceCriterion {
                    status: Status::Gray,
                    share_class: "N/A".to_string(),
                    points: 0,
                },
                debt: DebtCriterion {
                    status: Status::Gray,
                    current_ratio: 0.0,
                    points: 0,
                },
                ipo: IpoCriterion {
                    status: Status::Gray,
                    years: 0.0,
                    points: 0,
                },
            },
        }
    }
}

/// Listing age criterion
#[derive(Debug, Clone)]
pub struct ListingAge;

impl ListingAge {
    pub fn evaluate(
        ticker: &str,
        blue_chips: &[String],
        first_trade_epoch: Option<i64>,
        today: NaiveDate,
    ) -> IpoCriterion {
        if blue_chips.iter().any(|b| b == ticker) {
            return Self::from_years(BLUE_CHIP_YEARS);
        }

        let first_trade = first_trade_epoch
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive());

        match first_trade {
            Some(date) => Self::from_years(years_between(date, today)),
            None => IpoCriterion {
                status: Status::Gray,
                years: UNKNOWN_LISTING_YEARS,
                points: Self::points_for(UNKNOWN_LISTING_YEARS),
            },
        }
    }

    fn from_years(years: f64) -> IpoCriterion {
        let status = if years >= 7.0 {
            Status::Green
        } else if years >= 5.0 {
            Status::Yellow
        } else {
            Status::Red
        };
        IpoCriterion {
            status,
            years: rounded(years, 1),
            points: Self::points_for(years),
        }
    }

    fn points_for(years: f64) -> u8 {
        if years >= 7.0 {
            2
        } else if years >= 5.0 {
            1
        } else {
            0
        }
    }
}

/// Profitability criterion
#[derive(Debug, Clone)]
pub struct Profitability;

impl Profitability {
    /// GREEN only if every reported year is positive. Without annual
    /// history, a positive trailing EPS is accepted instead.
    pub fn evaluate(annual_net_income: &[f64], trailing_eps: Option<f64>) -> ProfitCriterion {
        let years: Vec<f64> = annual_net_income
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();

        if !years.is_empty() {
            let all_positive = years.iter().all(|v| *v > 0.0);
            return ProfitCriterion {
                status: if all_positive { Status::Green } else { Status::Red },
                years: years.len(),
                profitable: if all_positive { years.len() } else { 0 },
                points: if all_positive { 2 } else { 0 },
            };
        }

        match trailing_eps.filter(|eps| eps.is_finite()) {
            Some(eps) if eps > 0.0 => ProfitCriterion {
                status: Status::Green,
                years: 0,
                profitable: 0,
                points: 2,
            },
            Some(_) => ProfitCriterion {
                status: Status::Red,
                years: 0,
                profitable: 0,
                points: 0,
            },
            None => ProfitCriterion {
                status: Status::Gray,
                years: 0,
                profitable: 0,
                points: 0,
            },
        }
    }
}

/// Leverage (debt/EBITDA) criterion
#[derive(Debug, Clone)]
pub struct Leverage;

impl Leverage {
    pub fn evaluate(debt_to_ebitda: Option<f64>) -> DebtCriterion {
        let ratio = debt_to_ebitda.map(|r| sanitize(&r)).filter(|r| *r != 0.0);

        match ratio {
            Some(r) if r > 3.0 => DebtCriterion {
                status: Status::Red,
                current_ratio: rounded(r, 2),
                points: 0,
            },
            Some(r) if r > 2.0 => DebtCriterion {
                status: Status::Yellow,
                current_ratio: rounded(r, 2),
                points: 1,
            },
            Some(r) => DebtCriterion {
                status: Status::Green,
                current_ratio: rounded(r, 2),
                points: 2,
            },
            None => DebtCriterion {
                status: Status::Gray,
                current_ratio: 0.0,
                points: 2,
            },
        }
    }
}

/// Governance criterion, from the share class encoded in the ticker
#[derive(Debug, Clone)]
pub struct Governance;

impl Governance {
    pub fn evaluate(ticker: &str) -> GovernanceCriterion {
        match ticker.chars().last() {
            Some('3') => GovernanceCriterion {
                status: Status::Green,
                share_class: "ON".to_string(),
                points: 2,
            },
            Some(_) => GovernanceCriterion {
                status: Status::Yellow,
                share_class: "PN".to_string(),
                points: 1,
            },
            None => GovernanceCriterion {
                status: Status::Gray,
                share_class: "N/A".to_string(),
                points: 0,
            },
        }
    }
}

/// Applies the rubric with a configurable blue-chip list
#[derive(Debug, Clone)]
pub struct Scorer {
    blue_chips: Vec<String>,
}

impl Scorer {
    pub fn new(blue_chips: Vec<String>) -> Self {
        Self { blue_chips }
    }

    /// Score a display ticker (no exchange suffix) from its fundamentals
    pub fn score(&self, ticker: &str, fundamentals: &Fundamentals, today: NaiveDate) -> AssetScore {
        if ticker.is_empty() {
            return AssetScore::unavailable(ticker);
        }

        let ipo = ListingAge::evaluate(ticker, &self.blue_chips, fundamentals.first_trade_epoch, today);
        let profit = Profitability::evaluate(&fundamentals.annual_net_income, fundamentals.trailing_eps);
        let debt = Leverage::evaluate(fundamentals.debt_to_ebitda);
        let governance = Governance::evaluate(ticker);

        let score = ipo.points + profit.points + debt.points + governance.points;

        let disqualified = [profit.status, debt.status, ipo.status].contains(&Status::Red);
        let verdict = if disqualified {
            Verdict::Red
        } else if score >= 8 {
            Verdict::Blue
        } else {
            Verdict::Yellow
        };

        AssetScore {
            ticker: ticker.to_string(),
            price: sanitize(&fundamentals.current_price),
            score,
            verdict,
            criteria: Criteria {
                profit,
                governance,
                debt,
                ipo,
            },
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_BLUE_CHIPS.iter().map(|s| s.to_string()).collect())
    }
}
