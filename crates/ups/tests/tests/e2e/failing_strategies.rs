//! End-to-end test: every strategy fails every generation.
//!
//! The run must plateau and stop as CONVERGED within the convergence window,
//! keeping the baseline as its best solution.

use std::sync::Arc;
use ups_engine::{EvolutionConfig, SurrogateEvaluator, TerminationReason};
use ups_strategies::FailingSynthesizer;
use ups_tests::{churn_problem, orchestrator_with};
use ups_types::{Origin, StrategyKind};

const WINDOW: usize = 4;

#[tokio::test]
async fn all_strategies_failing_converges_on_baseline() {
    let config = EvolutionConfig::default()
        .with_seed(8)
        .with_max_generations(100)
        .with_convergence_window(WINDOW);
    let orchestrator = orchestrator_with(config, Arc::new(SurrogateEvaluator::new()), Arc::new(FailingSynthesizer));

    let baseline = orchestrator.generate(&churn_problem()).await.unwrap();
    let outcome = orchestrator
        .evolve_from(&churn_problem(), baseline.clone())
        .await
        .unwrap();

    assert_eq!(outcome.reason, TerminationReason::Converged);
    assert_eq!(outcome.generation(), WINDOW as u64);
    assert_eq!(outcome.best().id, baseline.id);
    assert_eq!(outcome.best().origin(), Origin::Baseline);
    assert_eq!(outcome.state.archive.len(), 1);

    // Failures lower effectiveness below that of the strategy that merely
    // found nothing to recombine.
    let effectiveness = outcome.state.strategy_performance();
    assert!(effectiveness[&StrategyKind::LocalOptimization] < 0.0);
    assert!(effectiveness[&StrategyKind::StructuralChange] < 0.0);
    assert!(effectiveness[&StrategyKind::NoveltySearch] < 0.0);
    assert!(effectiveness[&StrategyKind::Crossover] >= effectiveness[&StrategyKind::LocalOptimization]);
    assert!(outcome.report.failures >= 3 * WINDOW as u64);
}
