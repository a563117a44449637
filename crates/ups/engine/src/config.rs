//! Evolution run configuration

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ups_archive::ArchiveConfig;
use ups_strategies::StrategiesConfig;
use ups_tracker::{AllocationConfig, ConvergenceConfig, RunLimits, TrackerConfig};

/// Everything that parameterises one evolution run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub allocation: AllocationConfig,

    #[serde(default)]
    pub convergence: ConvergenceConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    #[serde(default)]
    pub strategies: StrategiesConfig,

    /// Seed for every random decision of the run; drawn at start when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Run budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Generations before BUDGET_EXHAUSTED; unbounded when absent
    #[serde(default = "default_max_generations")]
    pub max_generations: Option<u64>,

    /// Wall-clock budget in milliseconds
    #[serde(default)]
    pub max_wall_clock_ms: Option<u64>,

    /// Candidates proposed per generation, split across strategies
    #[serde(default = "default_candidates_per_generation")]
    pub candidates_per_generation: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_generations: default_max_generations(),
            max_wall_clock_ms: None,
            candidates_per_generation: default_candidates_per_generation(),
        }
    }
}

/// Concurrency limits and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Evaluations in flight at once, across all strategies
    #[serde(default = "default_evaluation_concurrency")]
    pub evaluation_concurrency: usize,

    /// Per-strategy proposal timeout
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Per-candidate evaluation timeout
    #[serde(default = "default_evaluation_timeout_ms")]
    pub evaluation_timeout_ms: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            evaluation_concurrency: default_evaluation_concurrency(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
            evaluation_timeout_ms: default_evaluation_timeout_ms(),
        }
    }
}

impl ConcurrencyConfig {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation_timeout_ms)
    }
}

impl EvolutionConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_generations(mut self, generations: u64) -> Self {
        self.budget.max_generations = Some(generations);
        self
    }

    pub fn with_wall_clock_ms(mut self, ms: u64) -> Self {
        self.budget.max_wall_clock_ms = Some(ms);
        self
    }

    pub fn with_candidates_per_generation(mut self, n: usize) -> Self {
        self.budget.candidates_per_generation = n;
        self
    }

    pub fn with_archive_capacity(mut self, capacity: usize) -> Self {
        self.archive.capacity = capacity;
        self
    }

    pub fn with_convergence_window(mut self, window: usize) -> Self {
        self.convergence.window = window;
        self
    }

    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_generations: self.budget.max_generations,
            max_wall_clock_ms: self.budget.max_wall_clock_ms,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.budget.candidates_per_generation == 0 {
            return Err(EngineError::InvalidConfig(
                "budget.candidates_per_generation must be at least 1".into(),
            ));
        }
        if self.concurrency.evaluation_concurrency == 0 {
            return Err(EngineError::InvalidConfig(
                "concurrency.evaluation_concurrency must be at least 1".into(),
            ));
        }
        if self.concurrency.strategy_timeout_ms == 0 || self.concurrency.evaluation_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig("timeouts must be positive".into()));
        }
        self.archive
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        self.tracker.validate()?;
        self.allocation.validate()?;
        self.convergence.validate()?;
        self.strategies.validate().map_err(EngineError::InvalidConfig)?;
        Ok(())
    }
}

fn default_max_generations() -> Option<u64> {
    Some(10)
}

fn default_candidates_per_generation() -> usize {
    20
}

fn default_evaluation_concurrency() -> usize {
    4
}

fn default_strategy_timeout_ms() -> u64 {
    30_000
}

fn default_evaluation_timeout_ms() -> u64 {
    60_000
}
