//! Transaction ledger with SQLite backend

use crate::error::{PortfolioError, Result};
use crate::finance::transaction::{NewTransaction, Transaction, TransactionId};
use crate::store::LedgerStore;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed ledger
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Create or open the ledger database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| PortfolioError::Storage(format!("Failed to open database: {}", e)))?;

        let mut ledger = Self { conn };
        ledger.create_tables()?;
        Ok(ledger)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PortfolioError::Storage(format!("Failed to create in-memory database: {}", e))
        })?;

        let mut ledger = Self { conn };
        ledger.create_tables()?;
        Ok(ledger)
    }

    /// Create database tables
    pub fn create_tables(&mut self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY,
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    quantity REAL NOT NULL,
                    price REAL NOT NULL,
                    type TEXT NOT NULL
                )",
                [],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to create transactions table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_ticker ON transactions(ticker)",
                [],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to create ticker index: {}", e)))?;

        Ok(())
    }

    /// Number of stored transactions
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<(String, Transaction)> {
        let raw_date: String = row.get(2)?;
        let txn = Transaction {
            id: row.get(0)?,
            symbol: row.get(1)?,
            date: NaiveDate::default(),
            quantity: row.get(3)?,
            price: row.get(4)?,
            asset_type: row.get(5)?,
        };
        Ok((raw_date, txn))
    }

    fn parse_date(raw: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| PortfolioError::Parse(format!("Bad date '{}' in ledger: {}", raw, e)))
    }
}

impl LedgerStore for SqliteLedger {
    fn list(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ticker, date, quantity, price, type
             FROM transactions ORDER BY date DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], Self::row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(raw_date, mut txn)| {
                txn.date = Self::parse_date(&raw_date)?;
                Ok(txn)
            })
            .collect()
    }

    fn insert(&mut self, txn: NewTransaction) -> Result<TransactionId> {
        let txn = txn.validated()?;

        self.conn
            .execute(
                "INSERT INTO transactions (ticker, date, quantity, price, type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &txn.symbol,
                    txn.date.format(DATE_FORMAT).to_string(),
                    txn.quantity,
                    txn.price,
                    &txn.asset_type,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to insert transaction: {}", e)))?;

        let id = self.conn.last_insert_rowid();
        log::info!("Inserted transaction {} ({})", id, txn.symbol);
        Ok(id)
    }

    fn insert_bulk(&mut self, txns: Vec<NewTransaction>) -> Result<Vec<TransactionId>> {
        let validated = txns
            .into_iter()
            .map(NewTransaction::validated)
            .collect::<Result<Vec<_>>>()?;

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(validated.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transactions (ticker, date, quantity, price, type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for txn in &validated {
                stmt.execute(params![
                    &txn.symbol,
                    txn.date.format(DATE_FORMAT).to_string(),
                    txn.quantity,
                    txn.price,
                    &txn.asset_type,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        log::info!("Inserted {} transactions", ids.len());
        Ok(ids)
    }

    fn update(&mut self, id: TransactionId, txn: NewTransaction) -> Result<bool> {
        let txn = txn.validated()?;

        let changed = self
            .conn
            .execute(
                "UPDATE transactions
                 SET ticker = ?1, date = ?2, quantity = ?3, price = ?4, type = ?5
                 WHERE id = ?6",
                params![
                    &txn.symbol,
                    txn.date.format(DATE_FORMAT).to_string(),
                    txn.quantity,
                    txn.price,
                    &txn.asset_type,
                    id,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to update transaction: {}", e)))?;

        if changed > 0 {
            log::info!("Updated transaction {}", id);
        }
        Ok(changed > 0)
    }

    fn delete(&mut self, id: TransactionId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if changed > 0 {
            log::info!("Deleted transaction {}", id);
        }
        Ok(changed > 0)
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM transactions", [])?;
        log::info!("Cleared {} transactions", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_txn(symbol: &str, date: &str, quantity: f64) -> NewTransaction {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap();
        NewTransaction::new(symbol, date, quantity, 20.0, "FII")
    }

    #[test]
    fn test_insert_and_list() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.insert(new_txn(" hglg11.sa ", "2023-01-10", 10.0)).unwrap();
        ledger.insert(new_txn("mxrf11.sa", "2023-02-10", 5.0)).unwrap();

        let txns = ledger.list().unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].symbol, "MXRF11.SA");
        assert_eq!(txns[1].symbol, "HGLG11.SA");
        assert_eq!(txns[1].date, NaiveDate::from_ymd_opt(2023, 1, 10).unwrap());
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let id = ledger.insert(new_txn("aaaa3", "2023-01-10", 10.0)).unwrap();

        assert!(!ledger.update(id + 100, new_txn("bbbb3", "2023-01-10", 1.0)).unwrap());
        assert!(ledger.update(id, new_txn("cccc3", "2023-01-11", -4.0)).unwrap());

        let txns = ledger.list().unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].symbol, "CCCC3");
        assert_eq!(txns[0].quantity, -4.0);
    }

    #[test]
    fn test_bulk_rejects_invalid_batch() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let batch = vec![
            new_txn("aaaa3", "2023-01-10", 10.0),
            new_txn("   ", "2023-01-11", 1.0),
        ];

        assert!(ledger.insert_bulk(batch).is_err());
        assert_eq!(ledger.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let ids = ledger
            .insert_bulk(vec![
                new_txn("aaaa3", "2023-01-10", 10.0),
                new_txn("bbbb3", "2023-01-11", 1.0),
                new_txn("cccc3", "2023-01-12", 2.0),
            ])
            .unwrap();

        assert!(ledger.delete(ids[0]).unwrap());
        assert!(!ledger.delete(ids[0]).unwrap());
        assert_eq!(ledger.clear().unwrap(), 2);
        assert_eq!(ledger.count().unwrap(), 0);
    }
}
