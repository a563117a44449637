#![deny(unsafe_code)]
//! # ups-engine
//!
//! Evolution Orchestrator for UPS.
//!
//! Takes one working solution plus a problem and searches for better variants
//! under a fixed budget. Every generation the four mutation strategies run
//! concurrently against an immutable archive snapshot, their proposals are
//! evaluated under a global concurrency limit, and the results are committed
//! to the archive and the performance tracker before the next generation is
//! dispatched.
//!
//! ```text
//! Orchestrator -> (shares) -> Strategies -> (candidates) -> Evaluator
//!      ^                                                       |
//!      +-------- Archive.add / Tracker.record <----------------+
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod evaluators;
pub mod orchestrator;
pub mod outcome;
pub mod simulated;
pub mod sink;
pub mod state;

pub use config::{BudgetConfig, ConcurrencyConfig, EvolutionConfig};
pub use environment::ProcessEnvironment;
pub use error::{EngineError, PersistError};
pub use evaluators::{parse_metrics, CascadeEvaluator, SandboxEvaluator};
pub use orchestrator::EvolutionOrchestrator;
pub use outcome::{
    EvaluationTiming, EvolutionOutcome, GenerationReport, OutcomeSummary, StrategyOutcome,
};
pub use simulated::{SurrogateEvaluator, TemplateGenerator};
pub use sink::{JsonLinesSink, MemorySink, StateSink};
pub use state::{CurrentBest, EvolutionState, RunPhase, StateSnapshot};
pub use ups_tracker::{EvolutionReport, TerminationReason};
