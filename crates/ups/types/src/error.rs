/// A candidate could not be scored. Absorbed per candidate; never fatal to a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
    #[error("solution exited with status {status:?}: {stderr}")]
    NonZeroExit { status: Option<i32>, stderr: String },
    #[error("evaluation produced no metrics")]
    NoMetrics,
    #[error("metric {name} is not finite: {value}")]
    InvalidMetric { name: String, value: f64 },
    #[error("evaluation timed out after {0}ms")]
    Timeout(u64),
    #[error("screened out: score {score} below threshold {threshold}")]
    Screened { score: f64, threshold: f64 },
    #[error("evaluator error: {0}")]
    Other(String),
}

/// The code synthesizer could not render a genome into an executable artifact.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis provider error: {0}")]
    Provider(String),
    #[error("genome rejected: {0}")]
    Rejected(String),
}

/// The solution generator could not produce a baseline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    #[error("baseline generation failed: {0}")]
    Failed(String),
    #[error("problem not supported: {0}")]
    Unsupported(String),
}

/// The execution environment could not run a piece of code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to start runner: {0}")]
    Spawn(String),
    #[error("runner io error: {0}")]
    Io(String),
    #[error("execution exceeded {0}ms")]
    Timeout(u64),
}
