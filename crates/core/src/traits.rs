//! Collaborator interfaces consumed by the lock strategies
//!
//! These traits describe the external services the facades rely on. The
//! workspace ships in-process implementations (`stockade-storage`,
//! `stockade-locks`), but the facades only ever see the traits.
//!
//! All methods are blocking. Implementations must be `Send + Sync` so a
//! single instance can be shared across worker threads behind an `Arc`.

use crate::error::Result;
use crate::types::{HolderToken, LockHandle, ProductId, StockRecord};
use std::time::{Duration, Instant};

/// Durable store of versioned stock records
///
/// Every successful write bumps the record's version exactly once,
/// whichever path performed it.
pub trait RecordStore: Send + Sync {
    /// Read the committed record
    ///
    /// Does not take a row lock and never blocks on one.
    fn read(&self, id: ProductId) -> Result<StockRecord>;

    /// Unconditionally write a new quantity
    ///
    /// Waits for any row lock held by an open transaction.
    fn write(&self, id: ProductId, quantity: u64) -> Result<StockRecord>;

    /// Write a new quantity only if the stored version still equals
    /// `expected_version`
    ///
    /// Returns `Error::VersionConflict` when another writer committed first.
    /// The compare and the swap are atomic.
    fn write_if_version(
        &self,
        id: ProductId,
        quantity: u64,
        expected_version: u64,
    ) -> Result<StockRecord>;

    /// Seed a new record at version 0
    fn insert(&self, id: ProductId, quantity: u64) -> Result<StockRecord>;

    /// Remove a record (fixture cleanup)
    fn remove(&self, id: ProductId) -> Result<Option<StockRecord>>;

    /// Start a new, independent unit of work
    ///
    /// The returned transaction never joins another open transaction.
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>>;

    /// Start a unit of work that must commit before `deadline`
    ///
    /// The effective deadline is the earlier of `deadline` and the store's
    /// own transaction timeout. A commit that reaches it rolls back with
    /// `Error::TransactionTimeout`; callers holding a leased lock pass the
    /// lease expiry so nothing is written once the lease has lapsed.
    fn begin_until(&self, deadline: Instant) -> Result<Box<dyn StoreTransaction + '_>>;
}

/// A unit of work against a [`RecordStore`]
///
/// Writes are buffered and become visible atomically on [`commit`].
/// Row locks taken by [`read_for_update`] or [`write`] are held until the
/// transaction ends. Dropping an open transaction rolls it back.
///
/// [`commit`]: StoreTransaction::commit
/// [`read_for_update`]: StoreTransaction::read_for_update
/// [`write`]: StoreTransaction::write
pub trait StoreTransaction {
    /// Read the record, seeing this transaction's own buffered write
    fn read(&mut self, id: ProductId) -> Result<StockRecord>;

    /// Read the record and take its exclusive row lock
    ///
    /// Blocks while another transaction holds the row lock, up to the
    /// store's row lock wait timeout.
    fn read_for_update(&mut self, id: ProductId) -> Result<StockRecord>;

    /// Buffer a new quantity for the record, taking its row lock
    fn write(&mut self, id: ProductId, quantity: u64) -> Result<()>;

    /// Apply buffered writes and release row locks
    ///
    /// Returns the committed records in write order.
    fn commit(self: Box<Self>) -> Result<Vec<StockRecord>>;

    /// Discard buffered writes and release row locks
    fn rollback(self: Box<Self>);
}

/// External distributed mutex provider
///
/// Grants are keyed by string and bounded by a lease so a crashed holder
/// cannot wedge the key forever.
pub trait DistributedLockService: Send + Sync {
    /// Set-if-absent with a lease; never blocks
    ///
    /// Returns `None` when another holder owns an unexpired grant.
    fn try_acquire(
        &self,
        key: &str,
        holder: HolderToken,
        ttl: Duration,
    ) -> Result<Option<LockHandle>>;

    /// Acquire, waiting up to `wait` for the current holder to release
    ///
    /// Waiters are woken by releases rather than polling. Returns `None`
    /// when the wait expires.
    fn acquire_wait(
        &self,
        key: &str,
        holder: HolderToken,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockHandle>>;

    /// Release a grant
    ///
    /// Returns `false` when the grant had already expired or been taken over
    /// by another holder; nothing is removed in that case.
    fn release(&self, handle: &LockHandle) -> Result<bool>;

    /// Current unexpired holder of `key`, if any
    fn holder(&self, key: &str) -> Result<Option<HolderToken>>;
}

/// Durable, session-scoped named mutex
///
/// Named locks are independent of any store transaction: they are only
/// released by an explicit [`release`](NamedLockService::release) or when
/// the holder's session ends ([`release_all`](NamedLockService::release_all)).
pub trait NamedLockService: Send + Sync {
    /// Acquire `key` for `holder`
    ///
    /// Blocks up to the service's configured timeout and then fails with
    /// `Error::LockAcquisitionTimeout`. Re-acquiring a key the holder
    /// already owns succeeds and must be matched by another release.
    fn acquire(&self, key: &str, holder: HolderToken) -> Result<LockHandle>;

    /// Release one acquisition of `handle.key`
    ///
    /// Returns `false` if the holder did not own the lock.
    fn release(&self, handle: &LockHandle) -> Result<bool>;

    /// Whether any holder currently owns `key`
    fn is_locked(&self, key: &str) -> Result<bool>;

    /// End `holder`'s session, releasing every key it still owns
    ///
    /// Returns how many keys were freed.
    fn release_all(&self, holder: HolderToken) -> Result<usize>;
}
