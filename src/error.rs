//! Unified error types for Stockade.
//!
//! Internal crates report detailed failures through
//! [`stockade_core::Error`]. This module folds them into the outcomes a
//! caller of `decrease` can act on.

use std::time::Duration;
use stockade_core::ProductId;
use thiserror::Error;

/// All Stockade errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Not enough stock left; nothing was written
    #[error("insufficient stock for product {id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Product whose stock ran out
        id: ProductId,
        /// Quantity observed under the lock
        available: u64,
        /// Amount asked for
        requested: u64,
    },

    /// A bounded lock wait expired; nothing was written
    #[error("timed out acquiring lock {key} after {waited:?}")]
    LockAcquisitionTimeout {
        /// Lock key
        key: String,
        /// Time spent waiting
        waited: Duration,
    },

    /// The record store or a lock service failed
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// No stock record for the product
    #[error("not found: {0}")]
    NotFound(ProductId),

    /// Unusable argument (zero amount, duplicate seed)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration is malformed or inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Stockade operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is the insufficient-stock outcome.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Error::InsufficientStock { .. })
    }

    /// Check if this is a lock acquisition timeout.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Error::LockAcquisitionTimeout { .. })
    }

    /// Check if this is an infrastructure failure.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Error::Infrastructure(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

// Convert from internal core errors
impl From<stockade_core::Error> for Error {
    fn from(e: stockade_core::Error) -> Self {
        use stockade_core::Error as CoreError;
        match e {
            CoreError::InsufficientStock {
                id,
                available,
                requested,
            } => Error::InsufficientStock {
                id,
                available,
                requested,
            },
            CoreError::LockAcquisitionTimeout { key, waited } => {
                Error::LockAcquisitionTimeout { key, waited }
            }
            CoreError::NotFound(id) => Error::NotFound(id),
            CoreError::AlreadyExists(id) => {
                Error::InvalidInput(format!("stock record already exists: {}", id))
            }
            CoreError::InvalidInput(msg) => Error::InvalidInput(msg),
            CoreError::Config(msg) => Error::Config(msg),
            CoreError::Toml(e) => Error::Config(e.to_string()),
            // Absorbed by the optimistic facade; reaching a caller is a bug
            e @ CoreError::VersionConflict { .. } => Error::Internal(e.to_string()),
            e @ (CoreError::RowLockTimeout { .. }
            | CoreError::TransactionTimeout { .. }
            | CoreError::TransactionClosed
            | CoreError::LockService(_)
            | CoreError::Storage(_)
            | CoreError::Io(_)) => Error::Infrastructure(e.to_string()),
        }
    }
}
