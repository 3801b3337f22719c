//! Exclusive row locks
//!
//! One owner per product at a time. Waiters park on a shared condition
//! variable and are woken whenever any row is unlocked.

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use stockade_core::{Error, ProductId, Result};
use std::time::{Duration, Instant};

/// Identifier of the unit of work owning a row lock
pub(crate) type TxnId = u64;

#[derive(Debug, Default)]
pub(crate) struct RowLockTable {
    owners: Mutex<FxHashMap<ProductId, TxnId>>,
    released: Condvar,
}

impl RowLockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Lock `id` for `txn`, waiting at most `timeout`
    ///
    /// Returns `Ok(true)` when the lock was newly taken, `Ok(false)` when
    /// `txn` already owned it.
    pub(crate) fn lock(&self, id: ProductId, txn: TxnId, timeout: Duration) -> Result<bool> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut owners = self.owners.lock();
        loop {
            match owners.get(&id).copied() {
                None => {
                    owners.insert(id, txn);
                    return Ok(true);
                }
                Some(owner) if owner == txn => return Ok(false),
                Some(owner) => {
                    tracing::trace!(product_id = %id, txn, owner, "waiting for row lock");
                    if self.released.wait_until(&mut owners, deadline).timed_out()
                        && owners.contains_key(&id)
                    {
                        return Err(Error::RowLockTimeout {
                            id,
                            waited: started.elapsed(),
                        });
                    }
                }
            }
        }
    }

    /// Release every lock in `ids` that `txn` owns
    pub(crate) fn unlock_all(&self, txn: TxnId, ids: &[ProductId]) {
        if ids.is_empty() {
            return;
        }
        let mut owners = self.owners.lock();
        for id in ids {
            if owners.get(id) == Some(&txn) {
                owners.remove(id);
            }
        }
        drop(owners);
        self.released.notify_all();
    }

    pub(crate) fn owner(&self, id: ProductId) -> Option<TxnId> {
        self.owners.lock().get(&id).copied()
    }
}
