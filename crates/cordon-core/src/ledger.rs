//! Append-only transaction ledger

use crate::ids::{GroupId, TransactionId};
use crate::metadata::TransactionRecord;
use crate::{AccessError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct LedgerInner {
    records: HashMap<TransactionId, TransactionRecord>,
    order: Vec<TransactionId>,
}

/// Maps transaction ids to file placements. Entries are never changed or removed.
#[derive(Default)]
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under a fresh id
    pub fn append(&self, record: TransactionRecord) -> TransactionId {
        let mut inner = self.inner.write();
        let mut id = TransactionId::new();
        while inner.records.contains_key(&id) {
            id = TransactionId::new();
        }

        debug!(transaction = %id, group = %record.group, handle = %record.handle, "Transaction recorded");
        inner.records.insert(id.clone(), record);
        inner.order.push(id.clone());
        id
    }

    /// Resolve a transaction id
    pub fn lookup(&self, id: &str) -> Result<TransactionRecord> {
        if id.is_empty() {
            return Err(AccessError::TransactionIdEmpty);
        }
        self.inner
            .read()
            .records
            .get(&TransactionId::from(id))
            .cloned()
            .ok_or_else(|| AccessError::TransactionNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every transaction of a group, oldest first
    pub fn transactions_for_group(&self, group: &GroupId) -> Vec<(TransactionId, TransactionRecord)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| {
                inner
                    .records
                    .get(id)
                    .filter(|record| &record.group == group)
                    .map(|record| (id.clone(), record.clone()))
            })
            .collect()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("len", &self.len()).finish()
    }
}
