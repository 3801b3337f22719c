//! Main entry point for Stockade.
//!
//! [`Stockade`] wires the in-process record store and lock services to the
//! facade chosen by configuration.

use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use stockade_core::{LockStrategy, ProductId, RecordStore, StockRecord, StockadeConfig};
use stockade_engine::{Collaborators, DecreaseStock, StockFacade, StockService};
use stockade_locks::{MemoryLockService, MemoryNamedLockService};
use stockade_storage::ShardedRecordStore;

/// A configured stock counter.
///
/// Owns the record store, both lock services and the facade for the
/// configured [`LockStrategy`]. Share it across threads with `Arc`.
///
/// # Example
///
/// ```ignore
/// use stockade::prelude::*;
///
/// let stockade = Stockade::builder().strategy(LockStrategy::Optimistic).open()?;
/// stockade.seed(ProductId::new(1), 100)?;
/// let record = stockade.decrease(ProductId::new(1), 1)?;
/// assert_eq!(record.quantity, 99);
/// ```
pub struct Stockade {
    config: StockadeConfig,
    store: Arc<ShardedRecordStore>,
    distributed: Arc<MemoryLockService>,
    named: Arc<MemoryNamedLockService>,
    collaborators: Collaborators,
    facade: StockFacade,
}

impl Stockade {
    /// Open with the default configuration (pessimistic strategy).
    pub fn open() -> Result<Self> {
        Self::builder().open()
    }

    /// Open with configuration read from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        StockadeBuilder::from_file(path)?.open()
    }

    /// Create a builder for configuration.
    pub fn builder() -> StockadeBuilder {
        StockadeBuilder::new()
    }

    /// Active configuration
    pub fn config(&self) -> &StockadeConfig {
        &self.config
    }

    /// Strategy used by [`Stockade::decrease`]
    pub fn strategy(&self) -> LockStrategy {
        self.facade.strategy()
    }

    /// Create the stock record for `id`.
    ///
    /// Fails with `InvalidInput` if the product was already seeded.
    pub fn seed(&self, id: ProductId, quantity: u64) -> Result<StockRecord> {
        Ok(self.store.insert(id, quantity)?)
    }

    /// Current committed record for `id`
    pub fn stock(&self, id: ProductId) -> Result<StockRecord> {
        Ok(self.store.read(id)?)
    }

    /// Delete the record for `id`, returning it if it existed
    pub fn remove(&self, id: ProductId) -> Result<Option<StockRecord>> {
        Ok(self.store.remove(id)?)
    }

    /// Decrease the stock of `id` by `amount` under the configured strategy.
    ///
    /// # Errors
    ///
    /// - `InsufficientStock` if fewer than `amount` units remain
    /// - `LockAcquisitionTimeout` if a bounded lock wait expired
    /// - `Infrastructure` if the store or a lock service failed
    /// - `NotFound` if the product was never seeded
    pub fn decrease(&self, id: ProductId, amount: u64) -> Result<StockRecord> {
        Ok(self.facade.decrease(id, amount)?)
    }

    /// The facade behind [`Stockade::decrease`]
    pub fn facade(&self) -> &StockFacade {
        &self.facade
    }

    /// Build a facade for another strategy over the same store and locks.
    ///
    /// Use it on keys the configured strategy does not touch.
    pub fn facade_for(&self, strategy: LockStrategy) -> StockFacade {
        StockFacade::build(strategy, &self.config, &self.collaborators)
    }

    /// Decrement operation without any lock strategy
    pub fn stock_service(&self) -> &StockService {
        &self.collaborators.stock
    }

    /// The record store
    pub fn store(&self) -> &Arc<ShardedRecordStore> {
        &self.store
    }

    /// The distributed lock service used by spin and notify
    pub fn lock_service(&self) -> &Arc<MemoryLockService> {
        &self.distributed
    }

    /// The named lock service
    pub fn named_lock_service(&self) -> &Arc<MemoryNamedLockService> {
        &self.named
    }
}

impl std::fmt::Debug for Stockade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stockade")
            .field("strategy", &self.strategy())
            .field("records", &self.store.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Stockade`].
///
/// # Example
///
/// ```ignore
/// let stockade = Stockade::builder()
///     .strategy(LockStrategy::Spin)
///     .spin_lock(Duration::from_secs(3), Duration::from_millis(100))
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StockadeBuilder {
    config: StockadeConfig,
}

impl StockadeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_config(StockadeConfig::from_file(path)?))
    }

    /// Start from an existing configuration.
    pub fn with_config(config: StockadeConfig) -> Self {
        Self { config }
    }

    /// Select the lock strategy.
    pub fn strategy(mut self, strategy: LockStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Bound on a transaction's wait for a row lock.
    pub fn row_lock_wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.store.row_lock_wait_timeout_ms = millis(timeout);
        self
    }

    /// Deadline after which a transaction can no longer commit.
    pub fn transaction_timeout(mut self, timeout: Duration) -> Self {
        self.config.store.transaction_timeout_ms = millis(timeout);
        self
    }

    /// Sleep between optimistic retries.
    pub fn optimistic_backoff(mut self, backoff: Duration) -> Self {
        self.config.optimistic.backoff_ms = millis(backoff);
        self
    }

    /// How long a named-lock acquire may wait.
    pub fn named_lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.named_lock.acquire_timeout_ms = millis(timeout);
        self
    }

    /// Lease TTL and polling interval for the spin strategy.
    pub fn spin_lock(mut self, ttl: Duration, retry_interval: Duration) -> Self {
        self.config.spin_lock.ttl_ms = millis(ttl);
        self.config.spin_lock.retry_interval_ms = millis(retry_interval);
        self
    }

    /// Wait bound and lease for the notify strategy.
    pub fn notify_lock(mut self, wait: Duration, lease: Duration) -> Self {
        self.config.notify_lock.wait_ms = millis(wait);
        self.config.notify_lock.lease_ms = millis(lease);
        self
    }

    /// Validate the configuration and open.
    pub fn open(self) -> Result<Stockade> {
        let config = self.config;
        config.validate()?;

        let store = Arc::new(ShardedRecordStore::with_config(config.store.clone()));
        let distributed = Arc::new(MemoryLockService::new());
        let named = Arc::new(MemoryNamedLockService::new(config.named_lock.acquire_timeout()));
        let collaborators = Collaborators {
            stock: StockService::new(store.clone()),
            distributed: distributed.clone(),
            named: named.clone(),
        };
        let facade = StockFacade::build(config.strategy, &config, &collaborators);

        tracing::info!(strategy = %config.strategy, "stockade opened");
        Ok(Stockade {
            config,
            store,
            distributed,
            named,
            collaborators,
            facade,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
