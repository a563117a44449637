//! End-to-end test: a bounded archive under a stream of worse candidates.
//!
//! One strategy keeps proposing candidates that score below everything
//! already archived. The archive fills to capacity and stays there, and the
//! best solution never changes.

use std::sync::Arc;
use ups_engine::EvolutionConfig;
use ups_strategies::{MutationStrategy, TemplateSynthesizer};
use ups_tests::{churn_problem, declining_evaluator, orchestrator_with};
use ups_types::{Origin, StrategyKind};

#[tokio::test]
async fn archive_stabilises_at_capacity_and_best_is_kept() {
    let config = EvolutionConfig::default()
        .with_seed(21)
        .with_archive_capacity(10)
        .with_max_generations(25)
        .with_convergence_window(100);
    let local = MutationStrategy::from_config(StrategyKind::LocalOptimization, &config.strategies);
    let orchestrator = orchestrator_with(
        config,
        Arc::new(declining_evaluator(0.9)),
        Arc::new(TemplateSynthesizer::new()),
    )
    .with_strategies(vec![local]);

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();
    let baseline_id = outcome.best().id;

    assert_eq!(outcome.generation(), 25);
    assert_eq!(outcome.best().origin(), Origin::Baseline);
    assert_eq!(outcome.best_score(), 0.9);
    assert_eq!(outcome.state.archive.len(), 10);
    assert!(outcome.state.archive.contains(baseline_id));

    for report in &outcome.generation_reports {
        assert!(report.archive_size <= 10);
        assert_eq!(report.best_score, 0.9);
        assert_eq!(report.strategies.len(), 1);
    }
    let summary = outcome.state.archive.summary();
    assert!(summary.pruned > 0);
    assert_eq!(summary.best_id, Some(baseline_id));
}
