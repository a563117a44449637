//! End-to-end test: a strategy that exceeds its timeout.
//!
//! The slow strategy contributes nothing and is recorded as failed; the other
//! strategies' candidates still arrive and are archived.

use std::sync::Arc;
use std::time::Duration;
use ups_engine::{EvolutionConfig, SurrogateEvaluator};
use ups_tests::{churn_problem, orchestrator_with, StallingSynthesizer};
use ups_types::StrategyKind;

#[tokio::test]
async fn timed_out_strategy_is_a_failed_attempt() {
    let mut config = EvolutionConfig::default()
        .with_seed(31)
        .with_max_generations(2)
        .with_convergence_window(10);
    config.concurrency.strategy_timeout_ms = 200;
    let orchestrator = orchestrator_with(
        config,
        Arc::new(SurrogateEvaluator::new()),
        Arc::new(StallingSynthesizer::new(StrategyKind::NoveltySearch, Duration::from_secs(30))),
    );

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();
    assert_eq!(outcome.generation(), 2);

    for report in &outcome.generation_reports {
        let novelty = report.outcome(StrategyKind::NoveltySearch).unwrap();
        assert_eq!(novelty.proposed, 0);
        assert_eq!(novelty.archived, 0);
        assert!(novelty.error.as_deref().unwrap().contains("timeout"));
        assert!(novelty.observation < 0.0);

        let local = report.outcome(StrategyKind::LocalOptimization).unwrap();
        assert!(local.error.is_none());
        assert!(local.proposed > 0);
        assert!(report.candidates_archived() > 0);
    }

    assert!(outcome
        .state
        .archive
        .entries()
        .iter()
        .all(|e| e.solution.origin().strategy() != Some(StrategyKind::NoveltySearch)));
    let novelty_stats = &outcome.state.tracker.stats()[&StrategyKind::NoveltySearch];
    assert_eq!(novelty_stats.failures, 2);
}
