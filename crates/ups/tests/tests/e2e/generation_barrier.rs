//! End-to-end test: generations are separated by a full barrier.
//!
//! Verified from task completion timestamps: every evaluation of generation N
//! starts after N was dispatched and finishes before N settles, and N+1 is
//! dispatched only after N settled.

use std::sync::Arc;
use std::time::Duration;
use ups_engine::EvolutionConfig;
use ups_strategies::TemplateSynthesizer;
use ups_tests::{churn_problem, orchestrator_with, FnEvaluator};

#[tokio::test]
async fn no_generation_overlaps_the_next() {
    let evaluator = FnEvaluator::new(|solution| Ok(0.4 + 0.001 * solution.metadata.generation as f64))
        .with_latency(Duration::from_millis(3));
    let mut config = EvolutionConfig::default()
        .with_seed(5)
        .with_max_generations(4)
        .with_convergence_window(10);
    config.concurrency.evaluation_concurrency = 2;
    let orchestrator = orchestrator_with(config, Arc::new(evaluator), Arc::new(TemplateSynthesizer::new()));

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();
    let reports = &outcome.generation_reports;
    assert_eq!(reports.len(), 4);

    for report in reports {
        assert!(!report.evaluations.is_empty());
        assert!(report.dispatched_at <= report.settled_at);
        for timing in &report.evaluations {
            assert!(timing.started_at >= report.dispatched_at);
            assert!(timing.finished_at <= report.settled_at);
            assert!(timing.started_at <= timing.finished_at);
        }
    }
    for pair in reports.windows(2) {
        assert!(pair[0].settled_at <= pair[1].dispatched_at);
        let last_finished = pair[0].evaluations.iter().map(|t| t.finished_at).max().unwrap();
        let first_started = pair[1].evaluations.iter().map(|t| t.started_at).min().unwrap();
        assert!(last_finished <= first_started);
        assert_eq!(pair[0].generation + 1, pair[1].generation);
    }
}
