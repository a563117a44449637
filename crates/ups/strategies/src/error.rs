use ups_archive::ArchiveError;
use ups_types::SynthesisError;

/// Errors from a single strategy invocation. The orchestrator records them
/// against the strategy and carries on with the generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("parent selection failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("family {0} declares no tunable parameters")]
    NoTunableParameters(String),
    #[error("search space offers no structural alternative to {0}")]
    NoStructuralAlternative(String),
    #[error("search space declares no algorithm families")]
    EmptySearchSpace,
    #[error("timeout: strategy exceeded {0}ms")]
    Timeout(u64),
    #[error("strategy task aborted: {0}")]
    Aborted(String),
}
