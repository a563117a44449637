use crate::history::Breakthrough;
use serde::{Deserialize, Serialize};
use ups_types::StrategyKind;

/// Per-strategy standing at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyStanding {
    pub strategy: StrategyKind,
    pub effectiveness: f64,
    pub attempts: u64,
    pub candidates: u64,
    pub failures: u64,
    pub improvements: u64,
}

/// Summary of a finished (or interrupted) run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub baseline_score: Option<f64>,
    pub final_score: Option<f64>,
    /// `final / baseline`; absent when the baseline score is zero or unknown.
    pub improvement_factor: Option<f64>,
    pub generations_completed: u64,
    pub candidates_attempted: u64,
    pub successful_improvements: u64,
    pub failures: u64,
    pub breakthroughs: Vec<Breakthrough>,
    /// Most effective first.
    pub strategy_ranking: Vec<StrategyStanding>,
}

impl EvolutionReport {
    pub fn most_effective(&self) -> Option<StrategyKind> {
        self.strategy_ranking.first().map(|s| s.strategy)
    }
}
