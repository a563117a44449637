//! Per-generation and per-run results

use crate::state::EvolutionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ups_tracker::{EvolutionReport, TerminationReason};
use ups_types::{RunId, Solution, SolutionId, StrategyKind};

/// What one strategy contributed to a generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub strategy: StrategyKind,
    /// Candidate budget it was given.
    pub requested: usize,
    pub proposed: usize,
    pub archived: usize,
    pub evaluation_failures: usize,
    /// Set when the strategy itself failed or timed out.
    pub error: Option<String>,
    /// Effectiveness observation recorded for this generation.
    pub observation: f64,
}

/// Start and end of one candidate evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTiming {
    pub solution_id: SolutionId,
    pub strategy: StrategyKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u64,
    /// When strategies were dispatched.
    pub dispatched_at: DateTime<Utc>,
    /// When the last evaluation finished and the commit phase began.
    pub settled_at: DateTime<Utc>,
    pub allocation: BTreeMap<StrategyKind, f64>,
    pub strategies: Vec<StrategyOutcome>,
    pub evaluations: Vec<EvaluationTiming>,
    pub best_score: f64,
    pub delta: f64,
    pub archive_size: usize,
}

impl GenerationReport {
    pub fn outcome(&self, strategy: StrategyKind) -> Option<&StrategyOutcome> {
        self.strategies.iter().find(|o| o.strategy == strategy)
    }

    pub fn candidates_archived(&self) -> usize {
        self.strategies.iter().map(|o| o.archived).sum()
    }
}

/// Final result of a run: the best-known solution plus why the run stopped.
#[derive(Debug)]
pub struct EvolutionOutcome {
    pub reason: TerminationReason,
    pub detail: String,
    pub state: EvolutionState,
    pub generation_reports: Vec<GenerationReport>,
    pub report: EvolutionReport,
}

impl EvolutionOutcome {
    pub fn best(&self) -> &Solution {
        &self.state.current_best.solution
    }

    pub fn best_score(&self) -> f64 {
        self.state.current_best.score
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            run_id: self.state.run_id,
            reason: self.reason,
            detail: self.detail.clone(),
            generations: self.state.generation,
            best_score: self.best_score(),
            best: self.best().clone(),
            report: self.report.clone(),
        }
    }
}

/// Serialisable view of an [`EvolutionOutcome`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub run_id: RunId,
    pub reason: TerminationReason,
    pub detail: String,
    pub generations: u64,
    pub best_score: f64,
    pub best: Solution,
    pub report: EvolutionReport,
}
