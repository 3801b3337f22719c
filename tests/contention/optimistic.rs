//! Version behaviour of the optimistic strategy

use crate::common::*;
use stockade::prelude::*;

#[test]
fn test_every_success_gets_a_distinct_version() {
    let stockade = open(LockStrategy::Optimistic);
    let id = ProductId::new(1);
    stockade.seed(id, 100).unwrap();

    let mut outcomes = run_concurrent(&stockade, id, 100, 1);
    outcomes.versions.sort_unstable();

    assert_eq!(outcomes.versions, (1..=100).collect::<Vec<u64>>());
    assert_eq!(stockade.stock(id).unwrap().version, 100);
    assert!(stockade.facade().retry_count().is_some());
}

#[test]
fn test_sequential_versions_strictly_increase() {
    let stockade = open(LockStrategy::Optimistic);
    let id = ProductId::new(1);
    stockade.seed(id, 10).unwrap();

    let mut last = stockade.stock(id).unwrap().version;
    for _ in 0..10 {
        let record = stockade.decrease(id, 1).unwrap();
        assert!(record.version > last);
        last = record.version;
    }
    assert_eq!(stockade.facade().retry_count(), Some(0));
}

#[test]
fn test_contention_is_absorbed_by_retries() {
    let stockade = open(LockStrategy::Optimistic);
    let id = ProductId::new(1);
    stockade.seed(id, 50).unwrap();

    let outcomes = run_concurrent(&stockade, id, 50, 1);
    assert!(outcomes.other.is_empty(), "{:?}", outcomes.other);
    assert_eq!(outcomes.succeeded, 50);
    // Lost races never reach the store as commits
    assert_eq!(stockade.store().commit_count(), 50);
}
