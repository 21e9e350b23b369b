//! In-memory ledger (for testing and demos)

use crate::error::Result;
use crate::finance::transaction::{NewTransaction, Transaction, TransactionId};
use crate::store::{sort_for_display, LedgerStore};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    rows: BTreeMap<TransactionId, Transaction>,
    next_id: TransactionId,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn allocate_id(&mut self) -> TransactionId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }
}

impl LedgerStore for InMemoryLedger {
    fn list(&self) -> Result<Vec<Transaction>> {
        let mut txns: Vec<Transaction> = self.rows.values().cloned().collect();
        sort_for_display(&mut txns);
        Ok(txns)
    }

    fn insert(&mut self, txn: NewTransaction) -> Result<TransactionId> {
        let txn = txn.validated()?;
        let id = self.allocate_id();
        self.rows.insert(id, Transaction::from_new(id, txn));
        log::info!("Inserted transaction {}", id);
        Ok(id)
    }

    fn insert_bulk(&mut self, txns: Vec<NewTransaction>) -> Result<Vec<TransactionId>> {
        let validated = txns
            .into_iter()
            .map(NewTransaction::validated)
            .collect::<Result<Vec<_>>>()?;

        let ids = validated
            .into_iter()
            .map(|txn| {
                let id = self.allocate_id();
                self.rows.insert(id, Transaction::from_new(id, txn));
                id
            })
            .collect::<Vec<_>>();

        log::info!("Inserted {} transactions", ids.len());
        Ok(ids)
    }

    fn update(&mut self, id: TransactionId, txn: NewTransaction) -> Result<bool> {
        let txn = txn.validated()?;
        match self.rows.get_mut(&id) {
            Some(row) => {
                *row = Transaction::from_new(id, txn);
                log::info!("Updated transaction {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, id: TransactionId) -> Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.rows.len();
        self.rows.clear();
        log::info!("Cleared {} transactions", removed);
        Ok(removed)
    }
}
