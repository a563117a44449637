//! End-to-end test: cancellation raised in the middle of a generation.
//!
//! The run stops with CANCELLED and nothing from the interrupted generation
//! reaches the archive.

use std::sync::Arc;
use std::time::Duration;
use ups_engine::{EngineError, EvolutionConfig, MemorySink, RunPhase, TerminationReason};
use ups_strategies::TemplateSynthesizer;
use ups_tests::{churn_problem, orchestrator_with, FnEvaluator};
use ups_types::CancellationHandle;

#[tokio::test]
async fn cancel_mid_generation_discards_partial_results() {
    let cancel = CancellationHandle::new();
    let trigger = cancel.clone();
    // Generation 2 evaluations raise the signal and then stall.
    let evaluator = FnEvaluator::new(move |solution| {
        if solution.metadata.generation == 2 {
            trigger.cancel();
        }
        Ok(0.5 + 0.01 * solution.metadata.generation as f64)
    })
    .with_latency(Duration::from_millis(50));

    let sink = Arc::new(MemorySink::new());
    let config = EvolutionConfig::default()
        .with_seed(13)
        .with_max_generations(10)
        .with_convergence_window(10);
    let orchestrator = orchestrator_with(config, Arc::new(evaluator), Arc::new(TemplateSynthesizer::new()))
        .with_cancellation(cancel)
        .with_sink(sink.clone());

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();

    assert_eq!(outcome.reason, TerminationReason::Cancelled);
    assert_eq!(outcome.state.phase, RunPhase::Terminated(TerminationReason::Cancelled));
    assert_eq!(outcome.generation(), 1);
    assert_eq!(outcome.generation_reports.len(), 1);
    assert!(outcome
        .state
        .archive
        .entries()
        .iter()
        .all(|e| e.solution.metadata.generation <= 1));
    assert!(outcome.best().metadata.generation <= 1);
    assert!(outcome.state.archive.contains(outcome.best().id));
    assert_eq!(sink.len().await, 1);
}

#[tokio::test]
async fn cancel_before_baseline_is_reported_as_error() {
    let evaluator = FnEvaluator::new(|_| Ok(0.5)).with_latency(Duration::from_secs(5));
    let orchestrator = orchestrator_with(
        EvolutionConfig::default(),
        Arc::new(evaluator),
        Arc::new(TemplateSynthesizer::new()),
    );
    let cancel = orchestrator.cancellation_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let err = orchestrator.run(&churn_problem()).await.unwrap_err();
    assert_eq!(err, EngineError::Cancelled);
}
