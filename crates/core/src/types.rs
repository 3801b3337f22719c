//! Core types for stockade
//!
//! This module defines the fundamental types used throughout the system:
//! - [`ProductId`]: Key of the contended stock record
//! - [`StockRecord`]: Versioned counter with the decrement invariant
//! - [`HolderToken`]: Identity of one lock acquisition
//! - [`LockHandle`]: A held grant from a lock service

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Identifier of the product whose stock is being protected
///
/// ProductId is the key for every lock strategy:
/// - Row locks in the record store
/// - Named lock names (via `Display`)
/// - Distributed lock keys (via `Display`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(u64);

impl ProductId {
    /// Create a ProductId from its numeric value
    pub const fn new(id: u64) -> Self {
        ProductId(id)
    }

    /// Numeric value of this id
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Lock key for this product, shared by the named and distributed lock paths
    pub fn lock_key(&self) -> String {
        self.0.to_string()
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId(id)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A versioned stock counter
///
/// `quantity` is never negative by construction (`u64`), and the only
/// mutation path is [`StockRecord::decrease`], which refuses to go below
/// zero. `version` is owned by the record store: every persisted write
/// bumps it exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Product this record belongs to
    pub id: ProductId,
    /// Units currently in stock
    pub quantity: u64,
    /// Store-level version, incremented once per committed write
    pub version: u64,
    /// Unix timestamp (seconds) of the last committed write
    pub updated_at: i64,
}

impl StockRecord {
    /// Create a freshly seeded record at version 0
    pub fn new(id: ProductId, quantity: u64) -> Self {
        Self {
            id,
            quantity,
            version: 0,
            updated_at: Utc::now().timestamp(),
        }
    }

    /// Decrease the quantity by `amount`
    ///
    /// Fails with [`Error::InsufficientStock`] when the result would be
    /// negative; the record is left untouched in that case. A zero amount
    /// is rejected as invalid input.
    ///
    /// This method performs no concurrency control. Callers must already
    /// hold exclusive access to the record's key.
    pub fn decrease(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidInput(format!(
                "decrease amount for product {} must be positive",
                self.id
            )));
        }
        if self.quantity < amount {
            return Err(Error::InsufficientStock {
                id: self.id,
                available: self.quantity,
                requested: amount,
            });
        }
        self.quantity -= amount;
        Ok(())
    }

    /// Return the record as it looks after one more committed write
    pub fn next_version(&self, quantity: u64) -> Self {
        Self {
            id: self.id,
            quantity,
            version: self.version + 1,
            updated_at: Utc::now().timestamp(),
        }
    }
}

/// Identity of a single lock acquisition
///
/// Every facade call mints a fresh token so a release can only ever remove
/// the grant it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderToken(Uuid);

impl HolderToken {
    /// Create a new random token using UUID v4
    pub fn new() -> Self {
        HolderToken(Uuid::new_v4())
    }
}

impl Default for HolderToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HolderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A held mutual-exclusion grant
///
/// Handed out by a [`crate::DistributedLockService`] or a
/// [`crate::NamedLockService`] and passed back on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    /// Lock key (the product id rendered as a string)
    pub key: String,
    /// Holder that owns the grant
    pub holder: HolderToken,
    /// When the grant was obtained
    pub acquired_at: Instant,
    /// Lease length; `None` for session-scoped named locks
    pub ttl: Option<Duration>,
}

impl LockHandle {
    /// Create a handle acquired now
    pub fn new(key: impl Into<String>, holder: HolderToken, ttl: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            holder,
            acquired_at: Instant::now(),
            ttl,
        }
    }

    /// Instant the lease runs out, if the grant has one
    pub fn expires_at(&self) -> Option<Instant> {
        self.ttl.map(|ttl| self.acquired_at + ttl)
    }

    /// Whether the lease has already run out
    pub fn is_expired(&self) -> bool {
        self.expires_at()
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}
