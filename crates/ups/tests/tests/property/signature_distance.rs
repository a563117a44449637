//! Property tests: structural distance is a bounded, symmetric dissimilarity
//! and novelty stays in range.

use proptest::prelude::*;
use ups_archive::{distance, novelty, DistanceWeights, StructuralSignature};
use ups_tests::churn_problem;
use ups_types::{Genome, ParamValue, SearchSpace};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_genome() -> impl Strategy<Value = Genome> {
    let scaler = prop_oneof![Just("none"), Just("standard"), Just("minmax")];
    prop_oneof![
        (-2.0f64..3.0, scaler.clone()).prop_map(|(alpha, scaler)| Genome::new("linear")
            .with_component("scaler", scaler)
            .with_param("alpha", ParamValue::Float(alpha))),
        (0i64..40, scaler.clone()).prop_map(|(depth, scaler)| Genome::new("tree")
            .with_component("scaler", scaler)
            .with_param("depth", ParamValue::Int(depth))),
        ("[a-z]{1,6}", -100.0f64..100.0).prop_map(|(family, x)| Genome::new(family)
            .with_param("undeclared", ParamValue::Float(x))),
    ]
}

fn arb_weights() -> impl Strategy<Value = DistanceWeights> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(|(family, components, parameters)| {
        DistanceWeights {
            family,
            components,
            parameters,
        }
    })
}

fn space() -> SearchSpace {
    churn_problem().search_space
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn distance_is_symmetric_and_bounded(
        a in arb_genome(),
        b in arb_genome(),
        w in arb_weights(),
    ) {
        let space = space();
        let sa = StructuralSignature::from_genome(&a, &space);
        let sb = StructuralSignature::from_genome(&b, &space);

        let ab = distance(&sa, &sb, &w);
        let ba = distance(&sb, &sa, &w);
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&ab), "distance {} out of range", ab);
    }

    #[test]
    fn identical_signatures_are_zero_apart(a in arb_genome(), w in arb_weights()) {
        let sig = StructuralSignature::from_genome(&a, &space());
        prop_assert_eq!(distance(&sig, &sig.clone(), &w), 0.0);
    }

    #[test]
    fn novelty_is_bounded(
        target in arb_genome(),
        others in prop::collection::vec(arb_genome(), 0..8),
        k in 1usize..6,
    ) {
        let space = space();
        let w = DistanceWeights::default();
        let sig = StructuralSignature::from_genome(&target, &space);
        let centroids: Vec<StructuralSignature> = others
            .iter()
            .map(|g| StructuralSignature::from_genome(g, &space))
            .collect();
        let refs: Vec<&StructuralSignature> = centroids.iter().collect();

        let n = novelty(&sig, &refs, k, &w);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&n));
        if refs.is_empty() {
            prop_assert_eq!(n, 1.0);
        }
        // The target itself as a centroid makes it no more novel.
        let mut with_self = refs.clone();
        with_self.push(&sig);
        prop_assert!(novelty(&sig, &with_self, k, &w) <= n + 1e-12);
    }
}
