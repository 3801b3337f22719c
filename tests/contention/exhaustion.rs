//! Decrements that exactly drain, or overrun, the seeded stock

use crate::common::*;
use stockade::prelude::*;

fn drains_exactly(strategy: LockStrategy) {
    let stockade = open(strategy);
    let id = ProductId::new(1);
    stockade.seed(id, 100).unwrap();

    let outcomes = run_concurrent(&stockade, id, 100, 1);

    assert!(outcomes.other.is_empty(), "{}: {:?}", strategy, outcomes.other);
    assert_eq!(outcomes.succeeded, 100, "{}", strategy);
    assert_eq!(outcomes.insufficient, 0, "{}", strategy);
    assert_eq!(stockade.stock(id).unwrap().quantity, 0, "{}", strategy);
    assert!(!lock_held(&stockade, id));
}

fn overrun_is_rejected(strategy: LockStrategy) {
    let stockade = open(strategy);
    let id = ProductId::new(1);
    stockade.seed(id, 100).unwrap();

    let outcomes = run_concurrent(&stockade, id, 150, 1);

    assert!(outcomes.other.is_empty(), "{}: {:?}", strategy, outcomes.other);
    assert_eq!(outcomes.succeeded, 100, "{}", strategy);
    assert_eq!(outcomes.insufficient, 50, "{}", strategy);
    assert_eq!(stockade.stock(id).unwrap().quantity, 0, "{}", strategy);
    assert!(!lock_held(&stockade, id));
}

#[test]
fn test_pessimistic_drains_exactly() {
    drains_exactly(LockStrategy::Pessimistic);
}

#[test]
fn test_optimistic_drains_exactly() {
    drains_exactly(LockStrategy::Optimistic);
}

#[test]
fn test_named_drains_exactly() {
    drains_exactly(LockStrategy::Named);
}

#[test]
fn test_spin_drains_exactly() {
    drains_exactly(LockStrategy::Spin);
}

#[test]
fn test_notify_drains_exactly() {
    drains_exactly(LockStrategy::Notify);
}

#[test]
fn test_pessimistic_overrun() {
    overrun_is_rejected(LockStrategy::Pessimistic);
}

#[test]
fn test_optimistic_overrun() {
    overrun_is_rejected(LockStrategy::Optimistic);
}

#[test]
fn test_named_overrun() {
    overrun_is_rejected(LockStrategy::Named);
}

#[test]
fn test_spin_overrun() {
    overrun_is_rejected(LockStrategy::Spin);
}

#[test]
fn test_notify_overrun() {
    overrun_is_rejected(LockStrategy::Notify);
}

#[test]
fn test_pessimistic_with_default_config() {
    init_tracing();
    let stockade = std::sync::Arc::new(Stockade::open().unwrap());
    let id = ProductId::new(3);
    stockade.seed(id, 20).unwrap();

    let outcomes = run_concurrent(&stockade, id, 20, 1);
    assert_eq!(outcomes.succeeded, 20);
    assert_eq!(stockade.stock(id).unwrap().quantity, 0);
}

#[test]
fn test_distinct_keys_are_independent() {
    let stockade = open(LockStrategy::Notify);
    let first = ProductId::new(1);
    let second = ProductId::new(2);
    stockade.seed(first, 40).unwrap();
    stockade.seed(second, 10).unwrap();

    let a = {
        let stockade = std::sync::Arc::clone(&stockade);
        std::thread::spawn(move || run_concurrent(&stockade, first, 40, 1))
    };
    let b = run_concurrent(&stockade, second, 20, 1);
    let a = a.join().unwrap();

    assert_eq!(a.succeeded, 40);
    assert_eq!(b.succeeded, 10);
    assert_eq!(b.insufficient, 10);
    assert_eq!(stockade.stock(first).unwrap().quantity, 0);
    assert_eq!(stockade.stock(second).unwrap().quantity, 0);
}
