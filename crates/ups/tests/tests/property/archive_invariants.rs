//! Property tests: any sequence of archive insertions keeps the archive
//! bounded, keeps every entry evaluated, and never loses the best solution.

use proptest::prelude::*;
use std::collections::BTreeMap;
use ups_archive::{Archive, ArchiveConfig, ArchiveError};
use ups_tests::churn_problem;
use ups_types::{AggregationPolicy, Genome, Metrics, ParamValue, Solution};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_genome() -> impl Strategy<Value = Genome> {
    let scaler = prop_oneof![Just("none"), Just("standard"), Just("minmax")];
    prop_oneof![
        (0.0f64..1.0, scaler.clone()).prop_map(|(alpha, scaler)| Genome::new("linear")
            .with_component("scaler", scaler)
            .with_param("alpha", ParamValue::Float(alpha))),
        (1i64..=16, scaler.clone()).prop_map(|(depth, scaler)| Genome::new("tree")
            .with_component("scaler", scaler)
            .with_param("depth", ParamValue::Int(depth))),
        (1i64..=15, scaler).prop_map(|(k, scaler)| Genome::new("knn")
            .with_component("scaler", scaler)
            .with_param("k", ParamValue::Int(k))),
    ]
}

/// Mostly valid accuracy readings, sometimes nothing at all.
fn arb_metrics() -> impl Strategy<Value = Metrics> {
    prop_oneof![
        8 => (0.0f64..1.0).prop_map(|v| BTreeMap::from([("accuracy".to_string(), v)])),
        1 => Just(Metrics::new()),
    ]
}

fn new_archive(capacity: usize) -> Archive {
    Archive::new(
        ArchiveConfig::default().with_capacity(capacity),
        churn_problem().search_space,
        AggregationPolicy::weighted([("accuracy", 1.0)]),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn random_insertions_keep_archive_invariants(
        capacity in 1usize..12,
        inserts in prop::collection::vec((arb_genome(), arb_metrics()), 1..40),
    ) {
        let mut archive = new_archive(capacity);
        let mut best_seen: Option<f64> = None;

        for (genome, metrics) in inserts {
            let empty = metrics.is_empty();
            let solution = Solution::baseline("print(1)", genome);
            let id = solution.id;
            match archive.add(solution, metrics) {
                Ok(entry) => {
                    prop_assert!(!empty);
                    prop_assert_eq!(entry.id(), id);
                    best_seen = Some(best_seen.map_or(entry.score, |b: f64| b.max(entry.score)));
                }
                Err(ArchiveError::EmptyMetrics(rejected)) => {
                    prop_assert!(empty);
                    prop_assert_eq!(rejected, id);
                    prop_assert!(!archive.contains(id));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }

            prop_assert!(archive.len() <= capacity);
            prop_assert!(archive.entries().iter().all(|e| !e.solution.metrics.is_empty()));

            if let Some(best_score) = best_seen {
                let best = archive.best().unwrap();
                prop_assert_eq!(best.score, best_score);
                prop_assert!(archive.contains(best.id()));
                prop_assert!(archive.entries().iter().all(|e| e.score <= best.score));
            } else {
                prop_assert!(archive.best().is_none());
            }
        }
    }

    #[test]
    fn duplicate_ids_are_rejected(genome in arb_genome(), score in 0.0f64..1.0) {
        let mut archive = new_archive(10);
        let solution = Solution::baseline("print(1)", genome);
        let metrics = BTreeMap::from([("accuracy".to_string(), score)]);
        archive.add(solution.clone(), metrics.clone()).unwrap();
        prop_assert!(matches!(
            archive.add(solution, metrics),
            Err(ArchiveError::Duplicate(_))
        ));
        prop_assert_eq!(archive.len(), 1);
    }
}
