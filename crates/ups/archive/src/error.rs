use ups_types::SolutionId;

/// Errors from the solution archive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchiveError {
    #[error("solution {0} has no metrics; unevaluated solutions cannot be archived")]
    EmptyMetrics(SolutionId),
    #[error("solution {id} has non-finite metric {metric}")]
    InvalidMetric { id: SolutionId, metric: String },
    #[error("solution {0} is already archived")]
    Duplicate(SolutionId),
    #[error("parent selection requested on an empty archive")]
    Empty,
    #[error("weighted sampling failed: {0}")]
    Sampling(String),
    #[error("invalid archive configuration: {0}")]
    InvalidConfig(String),
}
