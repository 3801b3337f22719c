//! Stock decrement engine for stockade
//!
//! [`StockService`] is the decrement operation bound to a record store. It
//! is not safe under concurrency by itself. The facades in [`facade`] add
//! one lock strategy each, and [`StockFacade`] selects among them from a
//! [`LockStrategy`](stockade_core::LockStrategy).
//!
//! ```ignore
//! use stockade_engine::{Collaborators, DecreaseStock, StockFacade, StockService};
//!
//! let facade = StockFacade::build(LockStrategy::Notify, &config, &deps);
//! let record = facade.decrease(ProductId::new(1), 1)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod facade;
pub mod service;

#[cfg(test)]
mod testing;

pub use facade::{
    Collaborators, DecreaseStock, NamedLockFacade, NotifyLockFacade, OptimisticLockFacade,
    PessimisticLockFacade, SpinLockFacade, StockFacade,
};
pub use service::StockService;
