//! End-to-end test: one persisted state snapshot per completed generation.

use std::sync::Arc;
use ups_engine::{EvolutionConfig, JsonLinesSink, RunPhase, StateSnapshot};
use ups_tests::{churn_problem, surrogate_orchestrator};

#[tokio::test]
async fn snapshots_are_appended_per_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.jsonl");
    let config = EvolutionConfig::default()
        .with_seed(3)
        .with_max_generations(3)
        .with_convergence_window(10);
    let orchestrator = surrogate_orchestrator(config).with_sink(Arc::new(JsonLinesSink::new(&path)));

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let snapshots: Vec<StateSnapshot> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(snapshots.len(), 3);
    for (i, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.generation, i as u64 + 1);
        assert_eq!(snapshot.run_id, outcome.state.run_id);
        assert_eq!(snapshot.phase, RunPhase::Running);
        assert!(!snapshot.best_metrics.is_empty());
        assert_eq!(snapshot.strategy_performance.len(), 4);
        assert!((snapshot.allocation.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(snapshot.archive.size <= snapshot.archive.capacity);
    }

    let last = snapshots.last().unwrap();
    assert_eq!(last.best_id, outcome.best().id);
    assert_eq!(last.best_score, outcome.best_score());
}

#[tokio::test]
async fn unwritable_sink_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("state.jsonl");
    let config = EvolutionConfig::default().with_seed(3).with_max_generations(2);
    let orchestrator = surrogate_orchestrator(config).with_sink(Arc::new(JsonLinesSink::new(path)));

    let outcome = orchestrator.run(&churn_problem()).await.unwrap();
    assert_eq!(outcome.generation(), 2);
}
