//! Contention Integration Tests
//!
//! Every lock strategy under same-key contention: final quantity, outcome
//! counts, version ordering and lock release.

#[path = "../common/mod.rs"]
mod common;

mod exhaustion;
mod lock_release;
mod optimistic;
mod properties;
