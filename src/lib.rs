//! # Stockade
//!
//! Safe stock decrements under heavy contention, with the lock strategy
//! chosen by configuration.
//!
//! Every strategy gives the same guarantee: concurrent `decrease` calls on
//! one product never lose an update and never take the quantity below zero.
//! They differ in where the exclusion comes from.
//!
//! ## Quick Start
//!
//! ```ignore
//! use stockade::prelude::*;
//!
//! let stockade = Stockade::builder().strategy(LockStrategy::Notify).open()?;
//! stockade.seed(ProductId::new(1), 100)?;
//!
//! match stockade.decrease(ProductId::new(1), 1) {
//!     Ok(record) => println!("{} left", record.quantity),
//!     Err(e) if e.is_insufficient_stock() => println!("sold out"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! ## Strategies
//!
//! - `pessimistic`: row lock held by a store transaction
//! - `optimistic`: version-checked write, retried with a fixed backoff
//! - `named`: named lock around an independent transaction
//! - `spin`: distributed lock acquired by polling
//! - `notify`: distributed lock acquired by waiting for a release

#![warn(missing_docs)]

mod error;
mod stockade;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use stockade::{Stockade, StockadeBuilder};

// Re-export the building blocks
pub use stockade_core::{
    HolderToken, LockHandle, LockStrategy, ProductId, StockRecord, StockadeConfig,
};
pub use stockade_engine::{
    DecreaseStock, NamedLockFacade, NotifyLockFacade, OptimisticLockFacade,
    PessimisticLockFacade, SpinLockFacade, StockFacade, StockService,
};
