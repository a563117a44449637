//! Property tests: resource allocation always sums to one and respects the
//! configured floor and ceiling, whatever the effectiveness estimates are.

use proptest::prelude::*;
use std::collections::BTreeMap;
use ups_tracker::{
    clamp_shares, softmax_shares, AllocationConfig, ConvergenceConfig, PerformanceTracker,
    RunLimits, TrackerConfig,
};
use ups_types::{CancellationHandle, StrategyKind};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_kind() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![
        Just(StrategyKind::LocalOptimization),
        Just(StrategyKind::StructuralChange),
        Just(StrategyKind::Crossover),
        Just(StrategyKind::NoveltySearch),
    ]
}

/// One value per strategy.
fn arb_per_strategy(range: std::ops::Range<f64>) -> impl Strategy<Value = BTreeMap<StrategyKind, f64>> {
    prop::collection::vec(range, 4)
        .prop_map(|values| StrategyKind::ALL.iter().copied().zip(values).collect())
}

fn assert_bounded(shares: &BTreeMap<StrategyKind, f64>, floor: f64, ceiling: f64) {
    assert_eq!(shares.len(), StrategyKind::ALL.len());
    let total: f64 = shares.values().sum();
    assert!((total - 1.0).abs() < 1e-9, "shares sum to {}", total);
    for (kind, share) in shares {
        assert!(*share >= floor - 1e-9, "{} share {} below floor {}", kind, share, floor);
        assert!(*share <= ceiling + 1e-9, "{} share {} above ceiling {}", kind, share, ceiling);
    }
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn softmax_then_clamp_is_bounded(
        priors in arb_per_strategy(0.01..1.0),
        effectiveness in arb_per_strategy(-1.0..1.0),
        temperature in 0.01f64..1.0,
        floor in 0.0f64..0.2,
        ceiling in 0.3f64..1.0,
    ) {
        let shares = softmax_shares(&StrategyKind::ALL, &priors, &effectiveness, temperature);
        let total: f64 = shares.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);

        let clamped = clamp_shares(&StrategyKind::ALL, &shares, floor, ceiling);
        assert_bounded(&clamped, floor, ceiling);
    }

    #[test]
    fn clamp_handles_degenerate_shares(
        shares in arb_per_strategy(0.0..1.0),
        floor in 0.0f64..0.25,
        ceiling in 0.25f64..1.0,
    ) {
        assert_bounded(&clamp_shares(&StrategyKind::ALL, &shares, floor, ceiling), floor, ceiling);
    }

    /// Failures drive effectiveness negative; the losers keep their floor.
    #[test]
    fn tracker_allocation_stays_bounded_under_failures(
        failures in prop::collection::vec((arb_kind(), 0u64..20), 0..40),
    ) {
        let allocation = AllocationConfig::default();
        let (floor, ceiling) = (allocation.floor, allocation.ceiling);
        let mut tracker = PerformanceTracker::new(
            TrackerConfig::default(),
            allocation,
            ConvergenceConfig::default(),
            RunLimits::default(),
            CancellationHandle::new(),
        )
        .unwrap();

        for (kind, generation) in failures {
            tracker.record_failure(kind, generation, "synthetic failure");
        }
        assert_bounded(&tracker.recommend_allocation(), floor, ceiling);
    }
}
