//! Session-scoped named lock around an independent transaction

use super::DecreaseStock;
use crate::service::StockService;
use parking_lot::Mutex;
use std::sync::Arc;
use stockade_core::{HolderToken, NamedLockService, ProductId, Result, StockRecord};
use stockade_locks::LockGuard;

/// Holds the named lock for the product key while the decrement commits
///
/// The named lock is not tied to the store transaction: it is acquired
/// first, the decrement runs in its own transaction, and the lock is
/// released only after that transaction has committed or rolled back.
///
/// Named locks never expire. If the service fails during release the
/// holder's session is remembered and ended with `release_all` at the
/// start of a later call, once the service answers again.
#[derive(Clone)]
pub struct NamedLockFacade {
    stock: StockService,
    locks: Arc<dyn NamedLockService>,
    orphaned: Arc<Mutex<Vec<HolderToken>>>,
}

impl NamedLockFacade {
    /// Create the facade
    pub fn new(stock: StockService, locks: Arc<dyn NamedLockService>) -> Self {
        Self {
            stock,
            locks,
            orphaned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sessions whose release failed and that have not been ended yet
    pub fn orphaned_sessions(&self) -> usize {
        self.orphaned.lock().len()
    }

    fn reap_orphans(&self) {
        let pending = std::mem::take(&mut *self.orphaned.lock());
        if pending.is_empty() {
            return;
        }
        let still_held: Vec<HolderToken> = pending
            .into_iter()
            .filter(|holder| match self.locks.release_all(*holder) {
                Ok(freed) => {
                    tracing::info!(%holder, freed, "ended orphaned named lock session");
                    false
                }
                Err(e) => {
                    tracing::debug!(%holder, error = %e, "orphaned session not ended yet");
                    true
                }
            })
            .collect();
        self.orphaned.lock().extend(still_held);
    }
}

impl DecreaseStock for NamedLockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        self.reap_orphans();

        let key = id.lock_key();
        let holder = HolderToken::new();
        let handle = self.locks.acquire(&key, holder)?;
        let guard = LockGuard::named(self.locks.as_ref(), handle);
        let result = self.stock.decrease(id, amount);

        match guard.release() {
            Ok(true) => {}
            Ok(false) => tracing::warn!(key = %key, %holder, "named lock was not held at release"),
            Err(e) => {
                tracing::warn!(key = %key, %holder, error = %e, "named lock release failed, session orphaned");
                self.orphaned.lock().push(holder);
            }
        }
        result
    }
}

impl std::fmt::Debug for NamedLockFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLockFacade")
            .field("orphaned_sessions", &self.orphaned_sessions())
            .finish_non_exhaustive()
    }
}
