//! The decrement operation, persisted
//!
//! [`StockService`] turns [`StockRecord::decrease`] into a store write. It
//! does no concurrency control of its own: callers reach it through one of
//! the facades, which provide exclusion on the product key.

use std::sync::Arc;
use std::time::Instant;
use stockade_core::{Error, ProductId, RecordStore, Result, StockRecord, StoreTransaction};

/// Decrement operation bound to a record store
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn RecordStore>,
}

impl StockService {
    /// Create a service over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The backing record store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Decrease stock in a new, independent transaction
    ///
    /// The transaction is never nested in one the caller holds: it begins
    /// here and is committed before this returns, so the new quantity is
    /// visible to every other caller as soon as the result is `Ok`.
    pub fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let txn = self.store.begin()?;
        Self::decrease_and_commit(txn, id, amount)
    }

    /// Like [`decrease`](Self::decrease), but the commit must land before
    /// `deadline`
    ///
    /// Lease-based facades pass the lease expiry, so a holder that stalls
    /// past its lease is rolled back with [`Error::TransactionTimeout`]
    /// instead of overwriting the next holder's work.
    pub fn decrease_before(
        &self,
        id: ProductId,
        amount: u64,
        deadline: Instant,
    ) -> Result<StockRecord> {
        let txn = self.store.begin_until(deadline)?;
        Self::decrease_and_commit(txn, id, amount)
    }

    fn decrease_and_commit(
        mut txn: Box<dyn StoreTransaction + '_>,
        id: ProductId,
        amount: u64,
    ) -> Result<StockRecord> {
        let mut record = match txn.read(id) {
            Ok(record) => record,
            Err(e) => {
                txn.rollback();
                return Err(e);
            }
        };
        if let Err(e) = record
            .decrease(amount)
            .and_then(|()| txn.write(id, record.quantity))
        {
            txn.rollback();
            return Err(e);
        }
        let committed = txn.commit()?;
        committed_record(committed, id)
    }

    /// Decrease stock inside the caller's transaction
    ///
    /// Reads with `read_for_update`, so the row stays locked until the
    /// caller commits or rolls back. The returned record carries the new
    /// quantity but the pre-commit version.
    pub fn decrease_in(
        &self,
        txn: &mut (dyn StoreTransaction + '_),
        id: ProductId,
        amount: u64,
    ) -> Result<StockRecord> {
        let mut record = txn.read_for_update(id)?;
        record.decrease(amount)?;
        txn.write(id, record.quantity)?;
        Ok(record)
    }

    /// One optimistic attempt: plain read, then a version-conditioned write
    ///
    /// Returns [`Error::VersionConflict`] if another writer committed
    /// between the read and the write. Never retries.
    pub fn decrease_if_version(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let mut record = self.store.read(id)?;
        let expected = record.version;
        record.decrease(amount)?;
        self.store.write_if_version(id, record.quantity, expected)
    }
}

impl std::fmt::Debug for StockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockService").finish_non_exhaustive()
    }
}

/// Pick `id` out of a transaction's committed records
pub(crate) fn committed_record(committed: Vec<StockRecord>, id: ProductId) -> Result<StockRecord> {
    committed
        .into_iter()
        .find(|record| record.id == id)
        .ok_or_else(|| Error::Storage(format!("commit did not report product {}", id)))
}
