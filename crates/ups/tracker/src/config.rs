//! Configuration for effectiveness tracking, allocation and stopping

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ups_types::StrategyKind;

/// Effectiveness bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Weight of the newest observation in the moving average
    #[serde(default = "default_ewma_alpha")]
    pub ewma_alpha: f64,

    /// Observation recorded for a failed strategy attempt (as a negative)
    #[serde(default = "default_failure_penalty")]
    pub failure_penalty: f64,

    /// Attempt records retained
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Best-score jump that counts as a breakthrough
    #[serde(default = "default_breakthrough_delta")]
    pub breakthrough_delta: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: default_ewma_alpha(),
            failure_penalty: default_failure_penalty(),
            history_capacity: default_history_capacity(),
            breakthrough_delta: default_breakthrough_delta(),
        }
    }
}

/// How resource shares are derived from effectiveness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Starting split; also the softmax prior
    #[serde(default = "default_priors")]
    pub priors: BTreeMap<StrategyKind, f64>,

    /// Softmax temperature; lower reacts harder to effectiveness gaps
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Minimum share per strategy
    #[serde(default = "default_floor")]
    pub floor: f64,

    /// Maximum share per strategy
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            priors: default_priors(),
            temperature: default_temperature(),
            floor: default_floor(),
            ceiling: default_ceiling(),
        }
    }
}

/// Plateau detection and goal-based stopping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Generations of best-score deltas considered
    #[serde(default = "default_window")]
    pub window: usize,

    /// A delta below this counts as no improvement
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Stop once the best aggregate score reaches this value
    #[serde(default)]
    pub target_score: Option<f64>,

    /// Stop once the best solution meets every success criterion of the problem
    #[serde(default)]
    pub stop_on_success_criteria: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            epsilon: default_epsilon(),
            target_score: None,
            stop_on_success_criteria: false,
        }
    }
}

/// Hard run limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLimits {
    #[serde(default = "default_max_generations")]
    pub max_generations: Option<u64>,

    #[serde(default)]
    pub max_wall_clock_ms: Option<u64>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_generations: default_max_generations(),
            max_wall_clock_ms: None,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(TrackerError::InvalidConfig(format!(
                "ewma_alpha {} outside (0, 1]",
                self.ewma_alpha
            )));
        }
        if self.failure_penalty < 0.0 {
            return Err(TrackerError::InvalidConfig("failure_penalty must be non-negative".into()));
        }
        if self.history_capacity == 0 {
            return Err(TrackerError::InvalidConfig("history_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

impl AllocationConfig {
    /// Shares can only sum to one when `n * floor <= 1 <= n * ceiling`.
    pub fn validate(&self) -> Result<(), TrackerError> {
        let n = StrategyKind::ALL.len() as f64;
        if self.floor < 0.0 || self.ceiling > 1.0 || self.floor > self.ceiling {
            return Err(TrackerError::InvalidConfig(format!(
                "allocation bounds [{}, {}] invalid",
                self.floor, self.ceiling
            )));
        }
        if n * self.floor > 1.0 + 1e-9 || n * self.ceiling < 1.0 - 1e-9 {
            return Err(TrackerError::InvalidConfig(format!(
                "allocation bounds [{}, {}] infeasible for {} strategies",
                self.floor, self.ceiling, n
            )));
        }
        if self.temperature <= 0.0 {
            return Err(TrackerError::InvalidConfig("temperature must be positive".into()));
        }
        if self.priors.values().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(TrackerError::InvalidConfig("priors must be finite and non-negative".into()));
        }
        Ok(())
    }
}

impl ConvergenceConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.window == 0 {
            return Err(TrackerError::InvalidConfig("convergence window must be at least 1".into()));
        }
        if self.epsilon < 0.0 {
            return Err(TrackerError::InvalidConfig("epsilon must be non-negative".into()));
        }
        Ok(())
    }
}

fn default_ewma_alpha() -> f64 {
    0.3
}

fn default_failure_penalty() -> f64 {
    0.05
}

fn default_history_capacity() -> usize {
    1000
}

fn default_breakthrough_delta() -> f64 {
    0.05
}

fn default_priors() -> BTreeMap<StrategyKind, f64> {
    BTreeMap::from([
        (StrategyKind::LocalOptimization, 0.25),
        (StrategyKind::StructuralChange, 0.35),
        (StrategyKind::Crossover, 0.25),
        (StrategyKind::NoveltySearch, 0.15),
    ])
}

fn default_temperature() -> f64 {
    0.05
}

fn default_floor() -> f64 {
    0.05
}

fn default_ceiling() -> f64 {
    0.6
}

fn default_window() -> usize {
    5
}

fn default_epsilon() -> f64 {
    1e-4
}

fn default_max_generations() -> Option<u64> {
    Some(10)
}
