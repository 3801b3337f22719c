//! Error types for stockade internals
//!
//! Every crate in the workspace returns [`Result<T>`]. The root crate maps
//! these onto the public outcome taxonomy.

use crate::types::ProductId;
use std::time::Duration;
use thiserror::Error;

/// Result type for stockade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the record store, the lock services and the facades
#[derive(Debug, Error)]
pub enum Error {
    /// No record exists for the product
    #[error("stock record not found: {0}")]
    NotFound(ProductId),

    /// A record was seeded twice
    #[error("stock record already exists: {0}")]
    AlreadyExists(ProductId),

    /// Decrement would take the quantity below zero
    #[error("insufficient stock for product {id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Product whose stock ran out
        id: ProductId,
        /// Quantity at the time of the check
        available: u64,
        /// Amount the caller asked for
        requested: u64,
    },

    /// Conditional write lost a race (optimistic locking failure)
    #[error("version conflict on product {id}: expected {expected}, got {actual}")]
    VersionConflict {
        /// Product being written
        id: ProductId,
        /// Version the writer read
        expected: u64,
        /// Version found at write time
        actual: u64,
    },

    /// Bounded wait for a named or notify-based lock expired
    #[error("timed out acquiring lock {key} after {waited:?}")]
    LockAcquisitionTimeout {
        /// Lock key
        key: String,
        /// How long the caller waited
        waited: Duration,
    },

    /// Store-level row lock wait expired
    #[error("row lock wait timeout on product {id} after {waited:?}")]
    RowLockTimeout {
        /// Product whose row lock was contended
        id: ProductId,
        /// How long the transaction waited
        waited: Duration,
    },

    /// Transaction ran past its deadline and was rolled back
    #[error("transaction exceeded its {limit:?} limit ({elapsed:?} elapsed)")]
    TransactionTimeout {
        /// Time spent in the transaction
        elapsed: Duration,
        /// Configured transaction timeout
        limit: Duration,
    },

    /// Transaction used after commit or rollback
    #[error("transaction is no longer active")]
    TransactionClosed,

    /// Lock service unreachable or failed
    #[error("lock service error: {0}")]
    LockService(String),

    /// Record store unreachable or failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Caller passed an unusable argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration is malformed or inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only optimistic version conflicts may succeed on retry with fresh data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }

    /// Check if this is the business invariant failure.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Error::InsufficientStock { .. })
    }

    /// Check if this is a lock acquisition timeout.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Error::LockAcquisitionTimeout { .. })
    }

    /// Check if this is a version conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }

    /// Check if this error comes from the store or a lock service rather than
    /// from the caller's request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Error::RowLockTimeout { .. }
                | Error::TransactionTimeout { .. }
                | Error::TransactionClosed
                | Error::LockService(_)
                | Error::Storage(_)
                | Error::Io(_)
        )
    }
}
