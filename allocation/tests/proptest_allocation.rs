//! Property-based tests for emission allocation.
//!
//! These tests check the allocation rules for arbitrary rating sets rather
//! than the fixed demo users.

use billing_allocation::{plan_emission, AllocationError};
use proptest::prelude::*;

fn ratings() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..1_000_000, 1..16)
}

proptest! {
    /// Property: every user with a positive rating is planned at least one coin.
    #[test]
    fn prop_no_starvation(ratings in ratings(), amount in 1u64..10_000) {
        let overall: u64 = ratings.iter().sum();
        prop_assume!(amount <= overall);

        let plan = plan_emission(amount, &ratings).unwrap();
        prop_assert!(plan.shares().iter().all(|&s| s >= 1));
        prop_assert_eq!(plan.shares().len(), ratings.len());
    }

    /// Property: the remainder step never leaves the plan short of the request.
    #[test]
    fn prop_never_under_allocates(ratings in ratings(), amount in 1u64..10_000) {
        let overall: u64 = ratings.iter().sum();
        prop_assume!(amount <= overall);

        let plan = plan_emission(amount, &ratings).unwrap();
        prop_assert!(plan.planned_total() >= amount as u128);
    }

    /// Property: validation accepts exactly the plans that sum to the request.
    #[test]
    fn prop_validation_is_exact(ratings in ratings(), amount in 1u64..10_000) {
        let overall: u64 = ratings.iter().sum();
        prop_assume!(amount <= overall);

        let plan = plan_emission(amount, &ratings).unwrap();
        let exact = plan.planned_total() == amount as u128;
        match plan.validate() {
            Ok(()) => prop_assert!(exact),
            Err(AllocationError::Rejected { requested, planned }) => {
                prop_assert!(!exact);
                prop_assert_eq!(requested, amount);
                prop_assert_eq!(planned, plan.planned_total());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: only the last share can exceed its floor-division value.
    #[test]
    fn prop_remainder_only_on_last(ratings in ratings(), amount in 1u64..10_000) {
        let overall: u64 = ratings.iter().sum();
        prop_assume!(amount <= overall);

        let plan = plan_emission(amount, &ratings).unwrap();
        let last = ratings.len() - 1;
        for (i, (&share, &rating)) in plan.shares().iter().zip(&ratings).enumerate() {
            let floor = (rating / plan.coin_price).max(1);
            if i == last {
                prop_assert!(share >= floor);
            } else {
                prop_assert_eq!(share, floor);
            }
        }
    }

    /// Property: a request above the overall rating is refused without panicking.
    #[test]
    fn prop_oversized_request_refused(ratings in ratings(), extra in 1u64..1000) {
        let overall: u64 = ratings.iter().sum();
        let result = plan_emission(overall + extra, &ratings);
        let is_underflow = matches!(result, Err(AllocationError::PriceUnderflow { .. }));
        prop_assert!(is_underflow);
    }
}
