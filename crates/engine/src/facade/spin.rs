//! Distributed lock acquired by polling

use super::DecreaseStock;
use crate::service::StockService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stockade_core::{
    DistributedLockService, HolderToken, ProductId, Result, SpinLockConfig, StockRecord,
};
use stockade_locks::LockGuard;

/// Spins on `try_acquire` until the product key is free
///
/// Every attempt sets the lease TTL, so a holder that dies lets the next
/// caller in once its lease runs out. There is no bound on the total wait.
pub struct SpinLockFacade {
    stock: StockService,
    locks: Arc<dyn DistributedLockService>,
    ttl: Duration,
    retry_interval: Duration,
    attempts: AtomicU64,
}

impl SpinLockFacade {
    /// Create the facade
    pub fn new(
        stock: StockService,
        locks: Arc<dyn DistributedLockService>,
        config: &SpinLockConfig,
    ) -> Self {
        Self {
            stock,
            locks,
            ttl: config.ttl(),
            retry_interval: config.retry_interval(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Acquire attempts made so far, across all callers
    pub fn attempt_count(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl DecreaseStock for SpinLockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let key = id.lock_key();
        let holder = HolderToken::new();
        let mut attempt: u64 = 1;
        let handle = loop {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            if let Some(handle) = self.locks.try_acquire(&key, holder, self.ttl)? {
                break handle;
            }
            tracing::trace!(key = %key, %holder, attempt, "lock busy, spinning");
            thread::sleep(self.retry_interval);
            attempt += 1;
        };
        tracing::debug!(key = %key, %holder, attempt, "spin lock acquired");

        // The commit must land while the lease is still ours
        let lease_expiry = handle.expires_at();
        let _guard = LockGuard::distributed(self.locks.as_ref(), handle);
        match lease_expiry {
            Some(expiry) => self.stock.decrease_before(id, amount, expiry),
            None => self.stock.decrease(id, amount),
        }
    }
}

impl std::fmt::Debug for SpinLockFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLockFacade")
            .field("ttl", &self.ttl)
            .field("retry_interval", &self.retry_interval)
            .field("attempts", &self.attempt_count())
            .finish_non_exhaustive()
    }
}
