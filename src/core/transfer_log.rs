//! Append-only storage for transfer receipts
//!
//! The log is the audit trail of the ledger: one record per committed
//! transfer, written atomically with the balance mutations it describes.
//! There is deliberately no update or removal API.

use crate::types::{AccountId, LedgerError, TransferId, TransferRecord};
use dashmap::DashMap;

/// Append-only transfer receipt store
pub struct TransferLog {
    /// Map of transfer id to receipt
    records: DashMap<TransferId, TransferRecord>,
}

impl TransferLog {
    /// Create an empty log
    pub fn new() -> Self {
        TransferLog {
            records: DashMap::new(),
        }
    }

    /// Number of receipts in the log
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no receipts
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a receipt
    ///
    /// # Errors
    ///
    /// Returns a storage error if a receipt with the same id already
    /// exists; receipts are created exactly once.
    pub fn append(&self, record: TransferRecord) -> Result<TransferRecord, LedgerError> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.id) {
            Entry::Occupied(_) => Err(LedgerError::storage(format!(
                "duplicate transfer id {}",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Look up a receipt by id
    pub fn get(&self, id: TransferId) -> Result<TransferRecord, LedgerError> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::transfer_not_found(id))
    }

    /// All receipts touching the given account, oldest first
    pub fn for_account(&self, account: AccountId) -> Vec<TransferRecord> {
        let mut records: Vec<TransferRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().touches(account))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

impl Default for TransferLog {
    fn default() -> Self {
        Self::new()
    }
}
