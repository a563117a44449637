//! End-to-end test: a cascade whose cheap screen is optimistic about the
//! baseline and lukewarm about every candidate.
//!
//! Candidates below the screen threshold never reach the full evaluator and
//! never enter the archive, even when their screen score beats the baseline's
//! full score.

use std::sync::Arc;
use ups_engine::{CascadeEvaluator, EvolutionConfig, TerminationReason};
use ups_strategies::TemplateSynthesizer;
use ups_tests::{churn_problem, orchestrator_with, FnEvaluator};

#[tokio::test]
async fn candidates_failing_the_screen_stay_out_of_the_archive() {
    let screen = FnEvaluator::new(|solution| {
        Ok(if solution.metadata.generation == 0 { 0.9 } else { 0.55 })
    });
    let full = FnEvaluator::new(|_| Ok(0.3));
    let cascade = CascadeEvaluator::new(Arc::new(screen), Arc::new(full), 0.6);

    let config = EvolutionConfig::default()
        .with_seed(17)
        .with_max_generations(2)
        .with_convergence_window(10);
    let orchestrator = orchestrator_with(config, Arc::new(cascade), Arc::new(TemplateSynthesizer::new()));

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::BudgetExhausted);
    assert_eq!(outcome.state.archive.len(), 1);
    assert_eq!(outcome.best().metadata.generation, 0);
    assert!((outcome.state.current_best.score - 0.3).abs() < 1e-9);
    for report in &outcome.generation_reports {
        assert_eq!(report.candidates_archived(), 0);
        assert!(!report.evaluations.is_empty());
        assert!(report.evaluations.iter().all(|e| !e.succeeded));
    }
}
