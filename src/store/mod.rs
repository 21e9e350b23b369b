//! Transaction ledger storage
//!
//! The ledger is the only mutable state in the system. Stores are plain
//! handles: open one, use it, drop it.

pub mod import;
pub mod memory;
#[cfg(feature = "rusqlite-support")]
pub mod sqlite;

pub use memory::InMemoryLedger;
#[cfg(feature = "rusqlite-support")]
pub use sqlite::SqliteLedger;

use crate::error::Result;
use crate::finance::transaction::{NewTransaction, Transaction, TransactionId};

/// Keyed record store for ledger transactions
pub trait LedgerStore {
    /// All transactions, most recent date first
    fn list(&self) -> Result<Vec<Transaction>>;

    /// Insert one transaction and return its ID
    fn insert(&mut self, txn: NewTransaction) -> Result<TransactionId>;

    /// Insert many transactions atomically: all of them or none
    fn insert_bulk(&mut self, txns: Vec<NewTransaction>) -> Result<Vec<TransactionId>>;

    /// Replace a transaction. Returns `false` when the ID does not exist.
    fn update(&mut self, id: TransactionId, txn: NewTransaction) -> Result<bool>;

    /// Delete a transaction. Returns `false` when the ID does not exist.
    fn delete(&mut self, id: TransactionId) -> Result<bool>;

    /// Delete everything and return how many rows were removed
    fn clear(&mut self) -> Result<usize>;

    /// All transactions in (date, id) order
    fn list_chronological(&self) -> Result<Vec<Transaction>> {
        let mut txns = self.list()?;
        txns.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(txns)
    }
}

/// Display order shared by every store: date descending, newest ID first
pub(crate) fn sort_for_display(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}
