//! End-to-end test: a 0.70 baseline evolved for a fixed number of generations.

use std::sync::Arc;
use ups_engine::{EvolutionConfig, RunPhase, TerminationReason};
use ups_strategies::TemplateSynthesizer;
use ups_tests::{churn_problem, orchestrator_with, surrogate_orchestrator, FnEvaluator};

const GENERATIONS: u64 = 4;

#[tokio::test]
async fn improving_candidates_raise_best_accuracy() {
    // Every generation's candidates beat the previous generation's best.
    let evaluator = FnEvaluator::new(|solution| {
        Ok(0.70 + 0.02 * solution.metadata.generation as f64)
    });
    let config = EvolutionConfig::default()
        .with_seed(4)
        .with_max_generations(GENERATIONS)
        .with_convergence_window(10);
    let orchestrator = orchestrator_with(config, Arc::new(evaluator), Arc::new(TemplateSynthesizer::new()));

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::BudgetExhausted);
    assert_eq!(outcome.state.generation, GENERATIONS);
    assert_eq!(outcome.state.phase, RunPhase::Terminated(TerminationReason::BudgetExhausted));

    let best_accuracy = outcome.best().metrics["accuracy"];
    assert!(best_accuracy >= 0.70);
    assert!((best_accuracy - (0.70 + 0.02 * GENERATIONS as f64)).abs() < 1e-9);
    assert_eq!(outcome.best().metadata.generation, GENERATIONS);
    assert!(!outcome.best().lineage.is_empty());

    let report = &outcome.report;
    assert_eq!(report.baseline_score, Some(0.70));
    assert_eq!(report.generations_completed, GENERATIONS);
    assert!(report.successful_improvements >= GENERATIONS);
    assert!(report.improvement_factor.unwrap() > 1.0);
}

#[tokio::test]
async fn surrogate_run_never_regresses() {
    let config = EvolutionConfig::default()
        .with_seed(17)
        .with_max_generations(6)
        .with_convergence_window(10);
    let outcome = surrogate_orchestrator(config).run(&churn_problem()).await.unwrap();

    let mut previous = outcome.report.baseline_score.unwrap();
    for report in &outcome.generation_reports {
        assert!(report.best_score >= previous);
        previous = report.best_score;
    }
    assert_eq!(outcome.best_score(), previous);
    assert!(outcome.state.archive.contains(outcome.best().id));
    assert!(outcome.state.archive.entries().iter().all(|e| !e.solution.metrics.is_empty()));
}
