//! End-to-end test: seeded runs are reproducible.

use ups_engine::{EvolutionConfig, EvolutionOutcome};
use ups_tests::{churn_problem, surrogate_orchestrator};
use ups_types::SolutionId;

async fn seeded_run(seed: u64) -> EvolutionOutcome {
    let config = EvolutionConfig::default()
        .with_seed(seed)
        .with_max_generations(5)
        .with_convergence_window(10);
    surrogate_orchestrator(config).run(&churn_problem()).await.unwrap()
}

fn archived_ids(outcome: &EvolutionOutcome) -> Vec<SolutionId> {
    outcome.state.archive.entries().iter().map(|e| e.id()).collect()
}

#[tokio::test]
async fn identical_seeds_produce_identical_best() {
    let a = seeded_run(42).await;
    let b = seeded_run(42).await;

    assert_eq!(a.best().id, b.best().id);
    assert_eq!(a.best().genome(), b.best().genome());
    assert_eq!(a.best().code, b.best().code);
    assert_eq!(a.best_score(), b.best_score());
    assert_eq!(a.best().lineage, b.best().lineage);
    assert_eq!(archived_ids(&a), archived_ids(&b));
    assert_eq!(a.state.strategy_performance(), b.state.strategy_performance());

    for (x, y) in a.generation_reports.iter().zip(&b.generation_reports) {
        assert_eq!(x.allocation, y.allocation);
        assert_eq!(x.best_score, y.best_score);
    }
}

#[tokio::test]
async fn different_seeds_explore_differently() {
    let a = seeded_run(1).await;
    let b = seeded_run(2).await;
    assert_ne!(archived_ids(&a), archived_ids(&b));
}
