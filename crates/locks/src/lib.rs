//! Lock services for stockade
//!
//! Provides the two mutual-exclusion services the lock-based facades use,
//! plus the guard that releases a grant on every exit path.
//!
//! ## Services
//!
//! - **MemoryLockService**: distributed-style lock. Set-if-absent with a
//!   lease (`try_acquire`), and a bounded wait that is woken by releases
//!   instead of polling (`acquire_wait`).
//! - **MemoryNamedLockService**: session-scoped named lock. No lease; held
//!   until released explicitly. Acquisition waits up to a configured
//!   timeout.
//!
//! Both can be switched off with `set_available(false)` to exercise
//! infrastructure failure paths.
//!
//! ## Example
//!
//! ```ignore
//! use stockade_core::{DistributedLockService, HolderToken};
//! use stockade_locks::{LockGuard, MemoryLockService};
//! use std::time::Duration;
//!
//! let service = MemoryLockService::new();
//! if let Some(handle) = service.try_acquire("1", HolderToken::new(), Duration::from_secs(3))? {
//!     let _guard = LockGuard::distributed(&service, handle);
//!     // critical section
//! } // released here
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod guard;
pub mod memory;
pub mod named;

pub use guard::LockGuard;
pub use memory::MemoryLockService;
pub use named::MemoryNamedLockService;
