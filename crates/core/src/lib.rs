//! Core types and traits for stockade
//!
//! This crate defines the shared vocabulary of the workspace:
//! - [`StockRecord`]: the versioned counter protected by every lock strategy
//! - [`LockHandle`] / [`HolderToken`]: transient grants from a lock service
//! - [`RecordStore`], [`DistributedLockService`], [`NamedLockService`]: the
//!   collaborator interfaces the strategies consume
//! - [`StockadeConfig`]: startup configuration and its consistency checks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    LockStrategy, NamedLockConfig, NotifyLockConfig, OptimisticConfig, SpinLockConfig,
    StockadeConfig, StoreConfig,
};
pub use error::{Error, Result};
pub use traits::{DistributedLockService, NamedLockService, RecordStore, StoreTransaction};
pub use types::{HolderToken, LockHandle, ProductId, StockRecord};
