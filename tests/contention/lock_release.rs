//! Locks are free again after every call, whatever the outcome

use crate::common::*;
use std::time::{Duration, Instant};
use stockade::prelude::*;
use stockade::HolderToken;
use stockade_core::{DistributedLockService, NamedLockService};

const LOCKING: [LockStrategy; 3] = [LockStrategy::Named, LockStrategy::Spin, LockStrategy::Notify];

#[test]
fn test_lock_free_after_success_and_insufficient_stock() {
    for strategy in LOCKING {
        let stockade = open(strategy);
        let id = ProductId::new(1);
        stockade.seed(id, 1).unwrap();

        stockade.decrease(id, 1).unwrap();
        assert!(!lock_held(&stockade, id), "{} after success", strategy);

        assert!(stockade.decrease(id, 1).unwrap_err().is_insufficient_stock());
        assert!(!lock_held(&stockade, id), "{} after failure", strategy);
    }
}

#[test]
fn test_lock_free_after_missing_product() {
    for strategy in LOCKING {
        let stockade = open(strategy);
        let id = ProductId::new(404);
        assert!(stockade.decrease(id, 1).unwrap_err().is_not_found());
        assert!(!lock_held(&stockade, id), "{}", strategy);
    }
}

#[test]
fn test_store_failure_releases_lock() {
    for strategy in LOCKING {
        let stockade = open(strategy);
        let id = ProductId::new(1);
        stockade.seed(id, 5).unwrap();

        stockade.store().set_available(false);
        assert!(stockade.decrease(id, 1).unwrap_err().is_infrastructure());
        stockade.store().set_available(true);

        assert!(!lock_held(&stockade, id), "{}", strategy);
        assert_eq!(stockade.decrease(id, 1).unwrap().quantity, 4);
    }
}

#[test]
fn test_lock_service_failure_writes_nothing() {
    for strategy in [LockStrategy::Spin, LockStrategy::Notify] {
        let stockade = open(strategy);
        let id = ProductId::new(1);
        stockade.seed(id, 5).unwrap();

        stockade.lock_service().set_available(false);
        assert!(stockade.decrease(id, 1).unwrap_err().is_infrastructure());
        stockade.lock_service().set_available(true);
        assert_eq!(stockade.stock(id).unwrap().quantity, 5);
    }
}

#[test]
fn test_notify_times_out_when_lock_held_elsewhere() {
    init_tracing();
    let stockade = Stockade::builder()
        .strategy(LockStrategy::Notify)
        .notify_lock(Duration::from_millis(100), Duration::from_secs(1))
        .open()
        .unwrap();
    let id = ProductId::new(1);
    stockade.seed(id, 5).unwrap();

    let foreign = HolderToken::new();
    stockade
        .lock_service()
        .try_acquire(&id.lock_key(), foreign, Duration::from_secs(60))
        .unwrap()
        .unwrap();

    let started = Instant::now();
    let err = stockade.decrease(id, 1).unwrap_err();
    let waited = started.elapsed();

    assert!(err.is_lock_timeout());
    assert!(waited >= Duration::from_millis(100));
    assert!(waited < Duration::from_secs(5));
    assert_eq!(stockade.stock(id).unwrap().quantity, 5);
    // The foreign grant is untouched
    assert_eq!(stockade.lock_service().holder("1").unwrap(), Some(foreign));
}

#[test]
fn test_named_times_out_when_session_holds_lock() {
    init_tracing();
    let stockade = Stockade::builder()
        .strategy(LockStrategy::Named)
        .transaction_timeout(Duration::from_millis(50))
        .named_lock_timeout(Duration::from_millis(80))
        .open()
        .unwrap();
    let id = ProductId::new(1);
    stockade.seed(id, 5).unwrap();

    let session = HolderToken::new();
    stockade.named_lock_service().acquire("1", session).unwrap();

    let err = stockade.decrease(id, 1).unwrap_err();
    assert!(err.is_lock_timeout());

    // Ending the session frees its locks
    assert_eq!(stockade.named_lock_service().release_all(session).unwrap(), 1);
    assert_eq!(stockade.decrease(id, 1).unwrap().quantity, 4);
}

#[test]
fn test_spin_takes_over_expired_lease() {
    init_tracing();
    let stockade = Stockade::builder()
        .strategy(LockStrategy::Spin)
        .spin_lock(Duration::from_secs(3), Duration::from_millis(5))
        .open()
        .unwrap();
    let id = ProductId::new(1);
    stockade.seed(id, 5).unwrap();

    // A holder that dies without releasing
    stockade
        .lock_service()
        .try_acquire("1", HolderToken::new(), Duration::from_millis(50))
        .unwrap()
        .unwrap();

    assert_eq!(stockade.decrease(id, 1).unwrap().quantity, 4);
    assert!(stockade.facade().attempt_count().unwrap() > 1);
    assert!(!lock_held(&stockade, id));
}
