#[path = "e2e/archive_capacity.rs"]
mod archive_capacity;

#[path = "e2e/baseline_improvement.rs"]
mod baseline_improvement;

#[path = "e2e/failing_strategies.rs"]
mod failing_strategies;

#[path = "e2e/cancellation.rs"]
mod cancellation;

#[path = "e2e/determinism.rs"]
mod determinism;

#[path = "e2e/generation_barrier.rs"]
mod generation_barrier;

#[path = "e2e/strategy_timeout.rs"]
mod strategy_timeout;

#[path = "e2e/state_persistence.rs"]
mod state_persistence;

#[path = "e2e/screened_candidates.rs"]
mod screened_candidates;
