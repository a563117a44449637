#![deny(unsafe_code)]
//! # ups-types
//!
//! Shared data model for the UPS evolution engine: solutions and their
//! genomes, the immutable problem description, metric aggregation, and the
//! contracts of the external collaborators (solution generator, evaluator,
//! execution environment, code synthesizer).

pub mod cancel;
pub mod collaborator;
pub mod error;
pub mod genome;
pub mod ids;
pub mod problem;
pub mod scoring;
pub mod solution;
pub mod strategy;

pub use cancel::CancellationHandle;
pub use collaborator::{
    Evaluator, ExecutionEnvironment, ExecutionReport, ResourceLimits, SolutionGenerator,
    SynthesisRequest, Synthesizer,
};
pub use error::{EvaluationError, ExecutionError, GeneratorError, SynthesisError};
pub use genome::{Genome, ParamValue};
pub use ids::{RunId, SolutionId};
pub use problem::{FamilySpec, ParamSpec, Problem, SearchSpace};
pub use scoring::{metrics_valid, AggregationPolicy, Metrics};
pub use solution::{Origin, Solution, SolutionMetadata};
pub use strategy::{StrategyKind, Tier};
