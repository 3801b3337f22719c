//! Shared helpers for stockade integration tests

#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use stockade::prelude::*;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Install a test subscriber once per binary (filter with RUST_LOG)
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Open a stockade tuned for tests: short backoff and polling, generous
/// waits so slow CI machines never hit a timeout by accident
pub fn open(strategy: LockStrategy) -> Arc<Stockade> {
    init_tracing();
    let stockade = Stockade::builder()
        .strategy(strategy)
        .transaction_timeout(Duration::from_secs(5))
        .optimistic_backoff(Duration::from_millis(1))
        .named_lock_timeout(Duration::from_secs(10))
        .spin_lock(Duration::from_secs(5), Duration::from_millis(2))
        .notify_lock(Duration::from_secs(10), Duration::from_secs(5))
        .open()
        .unwrap();
    Arc::new(stockade)
}

/// Tally of a concurrent run
#[derive(Debug, Default)]
pub struct Outcomes {
    pub succeeded: usize,
    pub insufficient: usize,
    pub versions: Vec<u64>,
    pub other: Vec<String>,
}

/// Fire `calls` concurrent `decrease(id, amount)` calls released together
/// by a barrier
pub fn run_concurrent(stockade: &Arc<Stockade>, id: ProductId, calls: usize, amount: u64) -> Outcomes {
    let barrier = Arc::new(Barrier::new(calls));
    let handles: Vec<_> = (0..calls)
        .map(|_| {
            let stockade = Arc::clone(stockade);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                stockade.decrease(id, amount)
            })
        })
        .collect();

    let mut outcomes = Outcomes::default();
    for h in handles {
        match h.join().unwrap() {
            Ok(record) => {
                outcomes.succeeded += 1;
                outcomes.versions.push(record.version);
            }
            Err(e) if e.is_insufficient_stock() => outcomes.insufficient += 1,
            Err(e) => outcomes.other.push(e.to_string()),
        }
    }
    outcomes
}

/// Whether any lock for `id` is still held
pub fn lock_held(stockade: &Stockade, id: ProductId) -> bool {
    use stockade_core::{DistributedLockService, NamedLockService};
    let key = id.lock_key();
    stockade.lock_service().holder(&key).unwrap().is_some()
        || stockade.named_lock_service().is_locked(&key).unwrap()
        || stockade.store().is_row_locked(id)
}
