//! Storage layer for stockade
//!
//! This crate implements the in-process record store with:
//! - ShardedRecordStore: DashMap-backed versioned stock records
//! - RowLockTable: per-product exclusive row locks with bounded waits
//! - MemoryTransaction: buffered unit of work, applied atomically on commit
//! - Compare-and-swap writes gated on the record version

#![warn(missing_docs)]
#![warn(clippy::all)]

mod row_lock;
pub mod sharded;
pub mod transaction;

pub use sharded::ShardedRecordStore;
pub use transaction::MemoryTransaction;
