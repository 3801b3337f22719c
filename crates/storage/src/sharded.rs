//! Sharded in-process record store
//!
//! DashMap keyed by product, with a row lock table on the side.
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, lock-free reads
//! - Row locks: exclusive per product, held by a transaction until it ends
//! - Versions: bumped exactly once per committed write, whatever the path
//!
//! # Thread Safety
//!
//! All operations are thread-safe:
//! - read(): Lock-free committed read, never waits on a row lock
//! - write() / write_if_version(): Take the row lock for the duration of
//!   the write, so they queue behind an open `read_for_update`
//! - Different products never contend
//!
//! # Example
//!
//! ```ignore
//! use stockade_storage::ShardedRecordStore;
//! use stockade_core::{ProductId, RecordStore};
//!
//! let store = ShardedRecordStore::new();
//! store.insert(ProductId::new(1), 100)?;
//! let record = store.read(ProductId::new(1))?;
//! ```

use crate::row_lock::{RowLockTable, TxnId};
use crate::transaction::{CommitDeadline, MemoryTransaction};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use stockade_core::{
    Error, ProductId, RecordStore, Result, StockRecord, StoreConfig, StoreTransaction,
};

/// In-process record store with row locks and CAS writes
pub struct ShardedRecordStore {
    /// Committed records
    records: DashMap<ProductId, StockRecord>,
    /// Exclusive row locks owned by open units of work
    pub(crate) row_locks: RowLockTable,
    /// Next unit-of-work id (transactions and single-statement writes)
    next_txn_id: AtomicU64,
    /// Committed write count across all records
    commits: AtomicU64,
    /// Fault switch; when false every operation fails with a storage error
    available: AtomicBool,
    pub(crate) config: StoreConfig,
}

impl ShardedRecordStore {
    /// Create a store with default timeouts
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with explicit timeouts
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            records: DashMap::new(),
            row_locks: RowLockTable::new(),
            next_txn_id: AtomicU64::new(1),
            commits: AtomicU64::new(0),
            available: AtomicBool::new(true),
            config,
        }
    }

    /// Store settings
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total committed writes
    #[inline]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Acquire)
    }

    /// Whether an open unit of work holds the row lock for `id`
    pub fn is_row_locked(&self, id: ProductId) -> bool {
        self.row_locks.owner(id).is_some()
    }

    /// Simulate the store going away (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Allocate a unit-of-work id
    #[inline]
    pub(crate) fn next_txn_id(&self) -> TxnId {
        self.next_txn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::Storage("record store unavailable".to_string()))
        }
    }

    pub(crate) fn row_lock_wait_timeout(&self) -> Duration {
        self.config.row_lock_wait_timeout()
    }

    /// Committed record without availability checks
    pub(crate) fn committed(&self, id: ProductId) -> Result<StockRecord> {
        self.records
            .get(&id)
            .map(|record| record.clone())
            .ok_or(Error::NotFound(id))
    }

    /// Apply one write, bumping the version
    ///
    /// `expected_version` turns the write into a compare-and-swap. The
    /// DashMap entry guard makes the compare and the swap atomic; the caller
    /// holds the row lock. A `deadline` is checked under the same guard, so
    /// a reader that sees the deadline as passed also sees every write
    /// applied before it.
    pub(crate) fn apply(
        &self,
        id: ProductId,
        quantity: u64,
        expected_version: Option<u64>,
        deadline: Option<&CommitDeadline>,
    ) -> Result<StockRecord> {
        let mut entry = self.records.get_mut(&id).ok_or(Error::NotFound(id))?;
        if let Some(deadline) = deadline {
            deadline.check()?;
        }
        if let Some(expected) = expected_version {
            if entry.version != expected {
                return Err(Error::VersionConflict {
                    id,
                    expected,
                    actual: entry.version,
                });
            }
        }
        let next = entry.next_version(quantity);
        *entry = next.clone();
        drop(entry);
        self.commits.fetch_add(1, Ordering::AcqRel);
        Ok(next)
    }

    /// Run a single-statement write under a short-lived row lock
    fn write_with_row_lock(
        &self,
        id: ProductId,
        quantity: u64,
        expected_version: Option<u64>,
    ) -> Result<StockRecord> {
        self.ensure_available()?;
        let txn = self.next_txn_id();
        self.row_locks.lock(id, txn, self.row_lock_wait_timeout())?;
        let result = self.apply(id, quantity, expected_version, None);
        self.row_locks.unlock_all(txn, &[id]);
        result
    }
}

impl RecordStore for ShardedRecordStore {
    fn read(&self, id: ProductId) -> Result<StockRecord> {
        self.ensure_available()?;
        self.committed(id)
    }

    fn write(&self, id: ProductId, quantity: u64) -> Result<StockRecord> {
        self.write_with_row_lock(id, quantity, None)
    }

    fn write_if_version(
        &self,
        id: ProductId,
        quantity: u64,
        expected_version: u64,
    ) -> Result<StockRecord> {
        self.write_with_row_lock(id, quantity, Some(expected_version))
    }

    fn insert(&self, id: ProductId, quantity: u64) -> Result<StockRecord> {
        self.ensure_available()?;
        match self.records.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::AlreadyExists(id)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let record = StockRecord::new(id, quantity);
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn remove(&self, id: ProductId) -> Result<Option<StockRecord>> {
        self.ensure_available()?;
        let txn = self.next_txn_id();
        self.row_locks.lock(id, txn, self.row_lock_wait_timeout())?;
        let removed = self.records.remove(&id).map(|(_, record)| record);
        self.row_locks.unlock_all(txn, &[id]);
        Ok(removed)
    }

    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>> {
        self.ensure_available()?;
        Ok(Box::new(MemoryTransaction::new(self, None)))
    }

    fn begin_until(&self, deadline: Instant) -> Result<Box<dyn StoreTransaction + '_>> {
        self.ensure_available()?;
        Ok(Box::new(MemoryTransaction::new(self, Some(deadline))))
    }
}

impl Default for ShardedRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedRecordStore")
            .field("records", &self.len())
            .field("commit_count", &self.commit_count())
            .finish()
    }
}
