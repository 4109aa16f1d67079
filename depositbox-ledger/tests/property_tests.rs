//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - Conservation: Σ(entries) == Σ(credited amounts)
//! - Rejection: non-positive credits never change state
//! - Durability: a reloaded ledger equals the one that was written
//! - Bridging: each pending association is consumed at most once

use depositbox_ledger::{
    DepositorId, ItemId, LedgerStore, PendingDepositTracker, Storage,
};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Strategy for generating depositor IDs from a small pool, so collisions happen
fn depositor_strategy() -> impl Strategy<Value = DepositorId> {
    prop_oneof![
        Just(DepositorId::new("76561198000000001")),
        Just(DepositorId::new("76561198000000002")),
        Just(DepositorId::new("76561198000000003")),
        "[0-9]{17}".prop_map(DepositorId::new),
    ]
}

/// Strategy for generating credit requests, including invalid amounts
fn credit_strategy() -> impl Strategy<Value = (DepositorId, i64)> {
    (depositor_strategy(), -5i64..1_000)
}

fn open_ledger(dir: &std::path::Path) -> LedgerStore {
    let storage = Arc::new(Storage::open_dir(dir).unwrap());
    LedgerStore::load(storage, "DepositBoxLog").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: total equals the sum of every accepted credit
    #[test]
    fn prop_total_conservation(credits in prop::collection::vec(credit_strategy(), 0..40)) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = open_ledger(temp_dir.path());

        let mut expected: HashMap<DepositorId, u64> = HashMap::new();
        let mut expected_total = 0u64;

        for (depositor, amount) in credits {
            let result = ledger.credit(&depositor, amount);
            if amount > 0 {
                prop_assert!(result.is_ok());
                *expected.entry(depositor).or_insert(0) += amount as u64;
                expected_total += amount as u64;
            } else {
                prop_assert!(result.is_err());
            }
        }

        prop_assert_eq!(ledger.total_credited(), expected_total);

        let snapshot = ledger.snapshot();
        prop_assert_eq!(snapshot.total(), expected_total);
        prop_assert_eq!(snapshot.iter().map(|(_, amount)| amount).sum::<u64>(), expected_total);
        for (depositor, amount) in &expected {
            prop_assert_eq!(snapshot.amount_for(depositor), *amount);
        }
    }

    /// Property: a reloaded ledger equals the ledger that was persisted
    #[test]
    fn prop_reload_round_trip(credits in prop::collection::vec(credit_strategy(), 1..20)) {
        let temp_dir = tempfile::tempdir().unwrap();

        let before = {
            let mut ledger = open_ledger(temp_dir.path());
            for (depositor, amount) in &credits {
                let _ = ledger.credit(depositor, *amount);
            }
            ledger.snapshot()
        };

        let after = open_ledger(temp_dir.path()).snapshot();
        prop_assert_eq!(before, after);
    }

    /// Property: each association is taken at most once
    #[test]
    fn prop_association_taken_once(
        items in prop::collection::vec((0u64..50, depositor_strategy()), 1..30)
    ) {
        let mut tracker = PendingDepositTracker::new();
        let mut latest: HashMap<u64, DepositorId> = HashMap::new();

        for (item, depositor) in &items {
            tracker.put(ItemId(*item), depositor.clone());
            latest.insert(*item, depositor.clone());
        }

        prop_assert_eq!(tracker.len(), latest.len());

        for (item, depositor) in &latest {
            prop_assert_eq!(tracker.take_if_present(ItemId(*item)), Some(depositor.clone()));
            prop_assert_eq!(tracker.take_if_present(ItemId(*item)), None);
        }

        prop_assert!(tracker.is_empty());
    }

    /// Property: percentages over a non-empty ledger never exceed 100
    #[test]
    fn prop_percentages_bounded(credits in prop::collection::vec(credit_strategy(), 0..20)) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = open_ledger(temp_dir.path());
        for (depositor, amount) in &credits {
            let _ = ledger.credit(depositor, *amount);
        }

        let snapshot = ledger.snapshot();
        for (depositor, _) in snapshot.iter() {
            let percentage = snapshot.percentage_for(depositor);
            prop_assert!(percentage >= rust_decimal::Decimal::ZERO);
            prop_assert!(percentage <= rust_decimal::Decimal::ONE_HUNDRED);
        }
    }
}
