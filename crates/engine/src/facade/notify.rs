//! Distributed lock acquired by waiting for a release notification

use super::DecreaseStock;
use crate::service::StockService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stockade_core::{
    DistributedLockService, Error, HolderToken, NotifyLockConfig, ProductId, Result, StockRecord,
};
use stockade_locks::LockGuard;

/// Waits on `acquire_wait` instead of polling
///
/// A single bounded wait: if the lock is not granted within `wait` the
/// decrement is abandoned with [`Error::LockAcquisitionTimeout`].
pub struct NotifyLockFacade {
    stock: StockService,
    locks: Arc<dyn DistributedLockService>,
    wait: Duration,
    lease: Duration,
}

impl NotifyLockFacade {
    /// Create the facade
    pub fn new(
        stock: StockService,
        locks: Arc<dyn DistributedLockService>,
        config: &NotifyLockConfig,
    ) -> Self {
        Self {
            stock,
            locks,
            wait: config.wait(),
            lease: config.lease(),
        }
    }
}

impl DecreaseStock for NotifyLockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let key = id.lock_key();
        let holder = HolderToken::new();
        let started = Instant::now();
        let Some(handle) = self.locks.acquire_wait(&key, holder, self.wait, self.lease)? else {
            let waited = started.elapsed();
            tracing::warn!(key = %key, %holder, ?waited, "gave up waiting for lock");
            return Err(Error::LockAcquisitionTimeout { key, waited });
        };
        tracing::debug!(key = %key, %holder, waited = ?started.elapsed(), "notify lock acquired");

        // The commit must land while the lease is still ours
        let lease_expiry = handle.expires_at();
        let _guard = LockGuard::distributed(self.locks.as_ref(), handle);
        match lease_expiry {
            Some(expiry) => self.stock.decrease_before(id, amount, expiry),
            None => self.stock.decrease(id, amount),
        }
    }
}

impl std::fmt::Debug for NotifyLockFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyLockFacade")
            .field("wait", &self.wait)
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}
