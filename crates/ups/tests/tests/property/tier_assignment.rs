//! Property tests: tiers follow the score distribution and do not depend on
//! the order solutions were archived in.

use proptest::prelude::*;
use std::collections::BTreeMap;
use ups_archive::{Archive, ArchiveConfig, TierCutPoints, TierPercentiles};
use ups_tests::churn_problem;
use ups_types::{AggregationPolicy, Genome, ParamValue, Solution, SolutionId, Tier};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_scored(n: std::ops::Range<usize>) -> impl Strategy<Value = Vec<(Solution, f64)>> {
    prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), n).prop_map(|items| {
        items
            .into_iter()
            .map(|(alpha, score)| {
                let genome = Genome::new("linear").with_param("alpha", ParamValue::Float(alpha));
                (Solution::baseline("print(1)", genome), score)
            })
            .collect()
    })
}

fn tiers_by_id(items: &[(Solution, f64)], capacity: usize) -> BTreeMap<SolutionId, Tier> {
    let mut archive = Archive::new(
        ArchiveConfig::default().with_capacity(capacity),
        churn_problem().search_space,
        AggregationPolicy::weighted([("accuracy", 1.0)]),
    )
    .unwrap();
    for (solution, score) in items {
        let metrics = BTreeMap::from([("accuracy".to_string(), *score)]);
        archive.add(solution.clone(), metrics).unwrap();
    }
    archive.entries().iter().map(|e| (e.id(), e.tier)).collect()
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn tiers_are_insertion_order_independent(
        items in arb_scored(1..30),
        rotate in 0usize..30,
    ) {
        let capacity = items.len() + 1;
        let forward = tiers_by_id(&items, capacity);

        let mut shuffled = items.clone();
        shuffled.reverse();
        let by = rotate % shuffled.len();
        shuffled.rotate_left(by);
        let permuted = tiers_by_id(&shuffled, capacity);

        prop_assert_eq!(forward.len(), items.len());
        prop_assert_eq!(forward, permuted);
    }

    #[test]
    fn higher_score_never_gets_a_lower_tier(
        scores in prop::collection::vec(0.0f64..1.0, 1..50),
    ) {
        let cuts = TierCutPoints::compute(&scores, &TierPercentiles::default()).unwrap();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        // Tier orders Elite first, so a better score maps to a smaller tier.
        for pair in sorted.windows(2) {
            prop_assert!(cuts.tier_of(pair[1]) <= cuts.tier_of(pair[0]));
        }
        prop_assert_eq!(cuts.tier_of(sorted[sorted.len() - 1]), Tier::Elite);
    }
}
