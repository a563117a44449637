use ups_archive::ArchiveError;
use ups_tracker::TrackerError;
use ups_types::{EvaluationError, GeneratorError};

/// Run-terminating errors. Per-candidate and per-strategy failures never
/// surface here; they only lower the originating strategy's effectiveness.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("solution generator failed: {0}")]
    GeneratorFailure(#[from] GeneratorError),
    #[error("baseline solution could not be scored: {0}")]
    BaselineRejected(EvaluationError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("invalid evolution configuration: {0}")]
    InvalidConfig(String),
    #[error("run cancelled before a valid solution existed")]
    Cancelled,
}

impl From<TrackerError> for EngineError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::InvalidConfig(msg) => EngineError::InvalidConfig(msg),
        }
    }
}

/// State persistence failures. Logged; never stop a run.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
