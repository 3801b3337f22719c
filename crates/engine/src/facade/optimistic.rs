//! Version-conditioned writes with fixed-backoff retry

use super::DecreaseStock;
use crate::service::StockService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use stockade_core::{OptimisticConfig, ProductId, Result, StockRecord};

/// Retries [`StockService::decrease_if_version`] until it wins
///
/// Only version conflicts are retried, with no bound on the number of
/// attempts. Everything else, insufficient stock included, goes straight
/// back to the caller.
#[derive(Debug)]
pub struct OptimisticLockFacade {
    stock: StockService,
    backoff: Duration,
    retries: AtomicU64,
}

impl OptimisticLockFacade {
    /// Create the facade
    pub fn new(stock: StockService, config: &OptimisticConfig) -> Self {
        Self {
            stock,
            backoff: config.backoff(),
            retries: AtomicU64::new(0),
        }
    }

    /// Version conflicts absorbed so far, across all callers
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }
}

impl DecreaseStock for OptimisticLockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        let mut attempt: u64 = 1;
        loop {
            match self.stock.decrease_if_version(id, amount) {
                Err(e) if e.is_retryable() => {
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(product_id = %id, attempt, error = %e, "version conflict, backing off");
                    thread::sleep(self.backoff);
                    attempt += 1;
                }
                Ok(record) => {
                    tracing::debug!(product_id = %id, attempt, version = record.version, "optimistic decrease committed");
                    return Ok(record);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
