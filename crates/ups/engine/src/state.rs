use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ups_archive::{Archive, ArchiveSummary};
use ups_tracker::{PerformanceTracker, TerminationReason};
use ups_types::{Metrics, RunId, Solution, SolutionId, StrategyKind};

/// Lifecycle of a run: `Initializing -> Running -> Terminated(reason)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "reason", rename_all = "snake_case")]
pub enum RunPhase {
    Initializing,
    Running,
    Terminated(TerminationReason),
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Initializing => f.write_str("INITIALIZING"),
            RunPhase::Running => f.write_str("RUNNING"),
            RunPhase::Terminated(reason) => write!(f, "TERMINATED({})", reason),
        }
    }
}

/// Best solution found so far, with its aggregate score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentBest {
    pub solution: Solution,
    pub score: f64,
}

/// The single mutable state of one evolution run, owned by the orchestrator.
#[derive(Debug)]
pub struct EvolutionState {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub current_best: CurrentBest,
    pub archive: Archive,
    /// Strategy effectiveness and the improvement window live here.
    pub tracker: PerformanceTracker,
    pub generation: u64,
    pub started_at: DateTime<Utc>,
}

impl EvolutionState {
    pub fn new(
        run_id: RunId,
        archive: Archive,
        tracker: PerformanceTracker,
        current_best: CurrentBest,
    ) -> Self {
        Self {
            run_id,
            phase: RunPhase::Initializing,
            current_best,
            archive,
            tracker,
            generation: 0,
            started_at: Utc::now(),
        }
    }

    pub fn strategy_performance(&self) -> &BTreeMap<StrategyKind, f64> {
        self.tracker.effectiveness()
    }

    /// Keep `current_best` equal to the archive's protected best.
    pub(crate) fn sync_best(&mut self) {
        if let Some(best) = self.archive.best() {
            if best.id() != self.current_best.solution.id {
                self.current_best = CurrentBest {
                    solution: best.solution.clone(),
                    score: best.score,
                };
            }
        }
    }

    /// Complete, order-independent record of the run at this instant.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            run_id: self.run_id,
            phase: self.phase,
            generation: self.generation,
            best_id: self.current_best.solution.id,
            best_score: self.current_best.score,
            best_metrics: self.current_best.solution.metrics.clone(),
            archive: self.archive.summary(),
            strategy_performance: self.tracker.effectiveness().clone(),
            allocation: self.tracker.recommend_allocation(),
            improvement_window: self.tracker.window().collect(),
            started_at: self.started_at,
            recorded_at: Utc::now(),
        }
    }
}

/// Persisted after every generation and published to monitors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub generation: u64,
    pub best_id: SolutionId,
    pub best_score: f64,
    pub best_metrics: Metrics,
    pub archive: ArchiveSummary,
    pub strategy_performance: BTreeMap<StrategyKind, f64>,
    /// Shares the next generation would receive.
    pub allocation: BTreeMap<StrategyKind, f64>,
    pub improvement_window: Vec<f64>,
    pub started_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(RunPhase::Running.to_string(), "RUNNING");
        assert_eq!(
            RunPhase::Terminated(TerminationReason::Cancelled).to_string(),
            "TERMINATED(CANCELLED)"
        );
    }

    #[test]
    fn phase_serde() {
        let phase = RunPhase::Terminated(TerminationReason::Converged);
        let json = serde_json::to_string(&phase).unwrap();
        assert!(json.contains("CONVERGED"));
        let restored: RunPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, phase);
    }
}
