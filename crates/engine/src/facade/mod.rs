//! Lock-strategy facades
//!
//! Each facade wraps [`StockService`] with one way of making concurrent
//! decrements on the same product safe:
//!
//! | Strategy | Facade | Exclusion provided by |
//! |----------|--------|-----------------------|
//! | `pessimistic` | [`PessimisticLockFacade`] | store row lock, held until commit |
//! | `optimistic` | [`OptimisticLockFacade`] | version check on write, retried on conflict |
//! | `named` | [`NamedLockFacade`] | named lock around an independent transaction |
//! | `spin` | [`SpinLockFacade`] | distributed lock, polled with `try_acquire` |
//! | `notify` | [`NotifyLockFacade`] | distributed lock, woken on release |
//!
//! Pick one per product key. Mixing strategies on the same key gives no
//! mutual exclusion between them.

mod named;
mod notify;
mod optimistic;
mod pessimistic;
mod spin;

pub use named::NamedLockFacade;
pub use notify::NotifyLockFacade;
pub use optimistic::OptimisticLockFacade;
pub use pessimistic::PessimisticLockFacade;
pub use spin::SpinLockFacade;

use crate::service::StockService;
use std::sync::Arc;
use stockade_core::{
    DistributedLockService, LockStrategy, NamedLockService, ProductId, Result, StockRecord,
    StockadeConfig,
};

/// Concurrency-safe stock decrement
pub trait DecreaseStock: Send + Sync {
    /// Decrease the stock of `id` by `amount`, never below zero
    ///
    /// Returns the record as committed. Fails with `InsufficientStock` when
    /// fewer than `amount` units are left.
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord>;
}

/// The external services a facade may need
#[derive(Clone)]
pub struct Collaborators {
    /// Decrement operation over the record store
    pub stock: StockService,
    /// Lease-based lock service (spin and notify)
    pub distributed: Arc<dyn DistributedLockService>,
    /// Session-scoped lock service (named)
    pub named: Arc<dyn NamedLockService>,
}

/// One facade per [`LockStrategy`], dispatched by `match`
#[derive(Debug)]
pub enum StockFacade {
    /// Row lock in a store transaction
    Pessimistic(PessimisticLockFacade),
    /// Version-conditioned write with retry
    Optimistic(OptimisticLockFacade),
    /// Named lock plus independent transaction
    NamedLock(NamedLockFacade),
    /// Polled distributed lock
    SpinLock(SpinLockFacade),
    /// Notified distributed lock
    NotifyLock(NotifyLockFacade),
}

impl StockFacade {
    /// Build the facade for `strategy`, tuned by `config`
    pub fn build(strategy: LockStrategy, config: &StockadeConfig, deps: &Collaborators) -> Self {
        let stock = deps.stock.clone();
        match strategy {
            LockStrategy::Pessimistic => StockFacade::Pessimistic(PessimisticLockFacade::new(stock)),
            LockStrategy::Optimistic => {
                StockFacade::Optimistic(OptimisticLockFacade::new(stock, &config.optimistic))
            }
            LockStrategy::Named => {
                StockFacade::NamedLock(NamedLockFacade::new(stock, Arc::clone(&deps.named)))
            }
            LockStrategy::Spin => StockFacade::SpinLock(SpinLockFacade::new(
                stock,
                Arc::clone(&deps.distributed),
                &config.spin_lock,
            )),
            LockStrategy::Notify => StockFacade::NotifyLock(NotifyLockFacade::new(
                stock,
                Arc::clone(&deps.distributed),
                &config.notify_lock,
            )),
        }
    }

    /// Strategy this facade implements
    pub fn strategy(&self) -> LockStrategy {
        match self {
            StockFacade::Pessimistic(_) => LockStrategy::Pessimistic,
            StockFacade::Optimistic(_) => LockStrategy::Optimistic,
            StockFacade::NamedLock(_) => LockStrategy::Named,
            StockFacade::SpinLock(_) => LockStrategy::Spin,
            StockFacade::NotifyLock(_) => LockStrategy::Notify,
        }
    }

    /// Version conflicts absorbed, for the optimistic strategy
    pub fn retry_count(&self) -> Option<u64> {
        match self {
            StockFacade::Optimistic(facade) => Some(facade.retry_count()),
            _ => None,
        }
    }

    /// Lock attempts made, for the spin strategy
    pub fn attempt_count(&self) -> Option<u64> {
        match self {
            StockFacade::SpinLock(facade) => Some(facade.attempt_count()),
            _ => None,
        }
    }
}

impl DecreaseStock for StockFacade {
    fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        tracing::trace!(product_id = %id, amount, strategy = %self.strategy(), "decrease");
        match self {
            StockFacade::Pessimistic(facade) => facade.decrease(id, amount),
            StockFacade::Optimistic(facade) => facade.decrease(id, amount),
            StockFacade::NamedLock(facade) => facade.decrease(id, amount),
            StockFacade::SpinLock(facade) => facade.decrease(id, amount),
            StockFacade::NotifyLock(facade) => facade.decrease(id, amount),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
