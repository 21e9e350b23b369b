//! Transaction - one entry of the portfolio ledger
//!
//! A Transaction records a purchase (positive quantity) or a sale (negative
//! quantity) of a symbol on a given date at a per-unit price. The asset type
//! is a free-form class label such as "Ação" or "FII".

use crate::error::{PortfolioError, Result};
use crate::types::{Cash, Price, Quantity, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction ID, assigned by the ledger store
pub type TransactionId = i64;

/// A stored ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: TransactionId,
    /// Uppercased ticker
    #[serde(rename = "ticker")]
    pub symbol: Symbol,
    /// Trade date
    pub date: NaiveDate,
    /// Units traded (negative for a sale)
    pub quantity: Quantity,
    /// Price per unit
    pub price: Price,
    /// Asset class label
    #[serde(rename = "type")]
    pub asset_type: String,
}

impl Transaction {
    /// Attach an ID to a validated new transaction
    pub fn from_new(id: TransactionId, new: NewTransaction) -> Self {
        Self {
            id,
            symbol: new.symbol,
            date: new.date,
            quantity: new.quantity,
            price: new.price,
            asset_type: new.asset_type,
        }
    }

    /// Signed cash value (quantity * price)
    pub fn value(&self) -> Cash {
        self.quantity * self.price
    }

    /// Check if this is a purchase
    pub fn is_buy(&self) -> bool {
        self.quantity > 0.0
    }

    /// Check if this is a sale
    pub fn is_sell(&self) -> bool {
        self.quantity < 0.0
    }
}

/// A transaction as submitted, before the store assigns an ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "ticker")]
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub quantity: Quantity,
    pub price: Price,
    #[serde(rename = "type")]
    pub asset_type: String,
}

impl NewTransaction {
    /// Create a new transaction. The symbol is normalized.
    pub fn new(
        symbol: &str,
        date: NaiveDate,
        quantity: Quantity,
        price: Price,
        asset_type: &str,
    ) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            date,
            quantity,
            price,
            asset_type: asset_type.to_string(),
        }
    }

    /// Normalize the symbol and reject entries no engine could use
    pub fn validated(mut self) -> Result<Self> {
        self.symbol = normalize_symbol(&self.symbol);

        if self.symbol.is_empty() {
            return Err(PortfolioError::InvalidTransaction(
                "symbol must not be empty".to_string(),
            ));
        }
        if !self.quantity.is_finite() {
            return Err(PortfolioError::InvalidTransaction(format!(
                "quantity for {} is not a finite number",
                self.symbol
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(PortfolioError::InvalidTransaction(format!(
                "price for {} must be a non-negative number, got {}",
                self.symbol, self.price
            )));
        }

        Ok(self)
    }
}

/// Uppercase and trim a ticker
pub fn normalize_symbol(symbol: &str) -> Symbol {
    symbol.trim().to_uppercase()
}

/// Display form of a ticker, without the exchange suffix (e.g. ".SA")
pub fn display_symbol(symbol: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return symbol.to_string();
    }
    symbol.replace(suffix, "")
}
