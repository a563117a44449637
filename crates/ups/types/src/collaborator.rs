//! Contracts of the external collaborators the evolution engine consumes.

use crate::error::{EvaluationError, ExecutionError, GeneratorError, SynthesisError};
use crate::genome::Genome;
use crate::problem::Problem;
use crate::scoring::{AggregationPolicy, Metrics};
use crate::solution::Solution;
use crate::strategy::StrategyKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Produces the baseline solution from a problem. Called once per run.
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    async fn generate_baseline(&self, problem: &Problem) -> Result<Solution, GeneratorError>;
}

/// Scores a solution against a problem.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, solution: &Solution, problem: &Problem)
        -> Result<Metrics, EvaluationError>;

    /// How metrics combine into the aggregate score used for ranking.
    fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy::uniform()
    }
}

/// Limits applied to one sandboxed execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub timeout_ms: u64,
    /// Captured stdout/stderr beyond this many bytes is dropped.
    pub max_output_bytes: usize,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_output_bytes: 1024 * 1024,
            env: BTreeMap::new(),
        }
    }
}

/// Outcome of one sandboxed execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub produced_artifacts: BTreeMap<String, Vec<u8>>,
    /// `None` when the process was terminated by a signal.
    pub exit_status: Option<i32>,
    pub elapsed_ms: u64,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Sandboxed runner for candidate code.
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    async fn execute(
        &self,
        code: &str,
        limits: &ResourceLimits,
    ) -> Result<ExecutionReport, ExecutionError>;
}

/// What a strategy asks the synthesizer to render.
#[derive(Debug)]
pub struct SynthesisRequest<'a> {
    pub kind: StrategyKind,
    pub genome: &'a Genome,
    pub parents: Vec<&'a Solution>,
    pub problem: &'a Problem,
    pub generation: u64,
}

/// Turns a genome into an executable artifact. This is the component that
/// "mutates a solution's representation"; strategies decide the genome, the
/// synthesizer writes the code.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<String, SynthesisError>;
}
