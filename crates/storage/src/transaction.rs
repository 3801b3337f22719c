//! Buffered unit of work over a [`ShardedRecordStore`]
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Check the transaction deadline
//! 2. Verify every written record still exists (row locks are held)
//! 3. Apply buffered writes, bumping each version once; the deadline is
//!    checked again under each record's entry guard
//! 4. Release row locks, waking waiters
//! ```
//!
//! The deadline is `store.transaction_timeout` after `begin`, or an earlier
//! instant passed to `begin_until`. Once it has passed the transaction is
//! rolled back and `Error::TransactionTimeout` is returned. Dropping a transaction that was
//! neither committed nor rolled back releases its row locks and discards
//! its writes.

use crate::row_lock::TxnId;
use crate::sharded::ShardedRecordStore;
use std::time::{Duration, Instant};
use stockade_core::{Error, ProductId, Result, StockRecord, StoreTransaction};

/// Transaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting reads and writes
    Active,
    /// Writes applied
    Committed,
    /// Writes discarded
    RolledBack,
}

/// Instant at which a transaction loses the right to apply writes
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommitDeadline {
    started: Instant,
    at: Option<Instant>,
}

impl CommitDeadline {
    fn new(started: Instant, timeout: Duration, until: Option<Instant>) -> Self {
        let at = match (started.checked_add(timeout), until) {
            (Some(own), Some(until)) => Some(own.min(until)),
            (own, until) => own.or(until),
        };
        Self { started, at }
    }

    /// Fails with `TransactionTimeout` once the deadline has been reached
    pub(crate) fn check(&self) -> Result<()> {
        let Some(at) = self.at else {
            return Ok(());
        };
        let now = Instant::now();
        if now < at {
            return Ok(());
        }
        Err(Error::TransactionTimeout {
            elapsed: now.saturating_duration_since(self.started),
            limit: at.saturating_duration_since(self.started),
        })
    }
}

/// Unit of work against a [`ShardedRecordStore`]
pub struct MemoryTransaction<'a> {
    store: &'a ShardedRecordStore,
    txn_id: TxnId,
    deadline: CommitDeadline,
    /// Rows locked by this transaction, in acquisition order
    locked: Vec<ProductId>,
    /// Buffered writes, one entry per product
    writes: Vec<(ProductId, u64)>,
    status: TransactionStatus,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn new(store: &'a ShardedRecordStore, until: Option<Instant>) -> Self {
        let txn_id = store.next_txn_id();
        let deadline = CommitDeadline::new(Instant::now(), store.config.transaction_timeout(), until);
        tracing::trace!(txn_id, ?until, "transaction started");
        Self {
            store,
            txn_id,
            deadline,
            locked: Vec::new(),
            writes: Vec::new(),
            status: TransactionStatus::Active,
        }
    }

    /// Id of this unit of work
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }

    /// Current state
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status == TransactionStatus::Active {
            Ok(())
        } else {
            Err(Error::TransactionClosed)
        }
    }

    fn lock_row(&mut self, id: ProductId) -> Result<()> {
        let newly_locked =
            self.store
                .row_locks
                .lock(id, self.txn_id, self.store.row_lock_wait_timeout())?;
        if newly_locked {
            self.locked.push(id);
        }
        Ok(())
    }

    fn buffered(&self, id: ProductId) -> Option<u64> {
        self.writes
            .iter()
            .find(|(written, _)| *written == id)
            .map(|(_, quantity)| *quantity)
    }

    /// Committed record overlaid with this transaction's own write
    fn visible(&self, id: ProductId) -> Result<StockRecord> {
        let mut record = self.store.committed(id)?;
        if let Some(quantity) = self.buffered(id) {
            record.quantity = quantity;
        }
        Ok(record)
    }

    fn finish(&mut self, status: TransactionStatus) {
        self.status = status;
        self.writes.clear();
        self.store.row_locks.unlock_all(self.txn_id, &self.locked);
        self.locked.clear();
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn read(&mut self, id: ProductId) -> Result<StockRecord> {
        self.ensure_active()?;
        self.store.ensure_available()?;
        self.visible(id)
    }

    fn read_for_update(&mut self, id: ProductId) -> Result<StockRecord> {
        self.ensure_active()?;
        self.store.ensure_available()?;
        self.lock_row(id)?;
        self.visible(id)
    }

    fn write(&mut self, id: ProductId, quantity: u64) -> Result<()> {
        self.ensure_active()?;
        self.store.ensure_available()?;
        self.lock_row(id)?;
        // Existence is checked up front so a bad id fails at the write
        self.store.committed(id)?;
        match self.writes.iter_mut().find(|(written, _)| *written == id) {
            Some(slot) => slot.1 = quantity,
            None => self.writes.push((id, quantity)),
        }
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<Vec<StockRecord>> {
        self.ensure_active()?;

        if let Err(e) = self.deadline.check() {
            tracing::warn!(txn_id = self.txn_id, error = %e, "transaction timed out, rolling back");
            self.finish(TransactionStatus::RolledBack);
            return Err(e);
        }

        if let Err(e) = self.store.ensure_available() {
            self.finish(TransactionStatus::RolledBack);
            return Err(e);
        }

        // Row locks are held on every written id, so nothing can remove or
        // rewrite them between this check and the apply below.
        if let Some((missing, _)) = self
            .writes
            .iter()
            .find(|(id, _)| self.store.committed(*id).is_err())
        {
            let missing = *missing;
            self.finish(TransactionStatus::RolledBack);
            return Err(Error::NotFound(missing));
        }

        let deadline = self.deadline;
        let applied: Result<Vec<StockRecord>> = self
            .writes
            .iter()
            .map(|(id, quantity)| self.store.apply(*id, *quantity, None, Some(&deadline)))
            .collect();
        let committed = match applied {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(txn_id = self.txn_id, error = %e, "commit abandoned");
                self.finish(TransactionStatus::RolledBack);
                return Err(e);
            }
        };

        tracing::debug!(txn_id = self.txn_id, writes = committed.len(), "transaction committed");
        self.finish(TransactionStatus::Committed);
        Ok(committed)
    }

    fn rollback(mut self: Box<Self>) {
        if self.status == TransactionStatus::Active {
            tracing::trace!(txn_id = self.txn_id, "transaction rolled back");
            self.finish(TransactionStatus::RolledBack);
        }
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            self.finish(TransactionStatus::RolledBack);
        }
    }
}
