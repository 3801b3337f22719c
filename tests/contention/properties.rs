//! Final quantity is always seeded minus successful decrements

use crate::common::*;
use proptest::prelude::*;
use rand::Rng;
use stockade::prelude::*;

fn any_strategy() -> impl Strategy<Value = LockStrategy> {
    prop::sample::select(LockStrategy::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_final_quantity_is_seed_minus_calls(
        strategy in any_strategy(),
        (seeded, calls) in (1u64..40).prop_flat_map(|q| (Just(q), 0..=q)),
    ) {
        let stockade = open(strategy);
        let id = ProductId::new(1);
        stockade.seed(id, seeded).unwrap();

        let outcomes = run_concurrent(&stockade, id, calls as usize, 1);
        prop_assert!(outcomes.other.is_empty(), "{:?}", outcomes.other);
        prop_assert_eq!(outcomes.succeeded as u64, calls);
        prop_assert_eq!(stockade.stock(id).unwrap().quantity, seeded - calls);
    }
}

#[test]
fn test_repeated_runs_agree() {
    for strategy in LockStrategy::ALL {
        let finals: Vec<u64> = (0..3)
            .map(|_| {
                let stockade = open(strategy);
                let id = ProductId::new(1);
                stockade.seed(id, 60).unwrap();
                run_concurrent(&stockade, id, 45, 1);
                stockade.stock(id).unwrap().quantity
            })
            .collect();
        assert_eq!(finals, vec![15, 15, 15], "{}", strategy);
    }
}

#[test]
fn test_mixed_amounts_account_exactly() {
    let mut rng = rand::thread_rng();
    for strategy in LockStrategy::ALL {
        let stockade = open(strategy);
        let id = ProductId::new(1);
        let seeded = 50;
        stockade.seed(id, seeded).unwrap();

        let amounts: Vec<u64> = (0..40).map(|_| rng.gen_range(1..=4)).collect();
        let handles: Vec<_> = amounts
            .iter()
            .map(|&amount| {
                let stockade = std::sync::Arc::clone(&stockade);
                std::thread::spawn(move || stockade.decrease(id, amount).map(|_| amount))
            })
            .collect();

        let mut taken = 0;
        for h in handles {
            match h.join().unwrap() {
                Ok(amount) => taken += amount,
                Err(e) => assert!(e.is_insufficient_stock(), "{}: {}", strategy, e),
            }
        }
        assert_eq!(stockade.stock(id).unwrap().quantity, seeded - taken, "{}", strategy);
    }
}
