//! Per-strategy tuning knobs

use serde::{Deserialize, Serialize};

/// Parameters of every strategy variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategiesConfig {
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub structural: StructuralConfig,
    #[serde(default)]
    pub crossover: CrossoverConfig,
    #[serde(default)]
    pub novelty: NoveltyConfig,
}

/// Local optimisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Probability of mutating the archive best instead of a tier-weighted pick
    #[serde(default = "default_prefer_best")]
    pub prefer_best: f64,

    /// Per-parameter mutation probability
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Largest step as a fraction of the declared range
    #[serde(default = "default_step_fraction")]
    pub step_fraction: f64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            prefer_best: default_prefer_best(),
            mutation_rate: default_mutation_rate(),
            step_fraction: default_step_fraction(),
        }
    }
}

/// Structural change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralConfig {
    /// Probability of swapping the algorithm family rather than one component
    #[serde(default = "default_family_swap_probability")]
    pub family_swap_probability: f64,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            family_swap_probability: default_family_swap_probability(),
        }
    }
}

/// Crossover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverConfig {
    #[serde(default = "default_parents_per_child")]
    pub parents_per_child: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            parents_per_child: default_parents_per_child(),
        }
    }
}

/// Novelty search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyConfig {
    /// Random genomes drawn per emitted candidate; the most novel wins
    #[serde(default = "default_trials_per_candidate")]
    pub trials_per_candidate: usize,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            trials_per_candidate: default_trials_per_candidate(),
        }
    }
}

impl StrategiesConfig {
    /// Human-readable description of the first invalid field, if any.
    pub fn validate(&self) -> Result<(), String> {
        let probabilities = [
            ("local.prefer_best", self.local.prefer_best),
            ("local.mutation_rate", self.local.mutation_rate),
            ("local.step_fraction", self.local.step_fraction),
            (
                "structural.family_swap_probability",
                self.structural.family_swap_probability,
            ),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} = {} outside [0, 1]", name, p));
            }
        }
        if self.local.step_fraction == 0.0 {
            return Err("local.step_fraction must be positive".into());
        }
        if self.crossover.parents_per_child < 2 {
            return Err("crossover.parents_per_child must be at least 2".into());
        }
        if self.novelty.trials_per_candidate == 0 {
            return Err("novelty.trials_per_candidate must be at least 1".into());
        }
        Ok(())
    }
}

fn default_prefer_best() -> f64 {
    0.5
}

fn default_mutation_rate() -> f64 {
    0.3
}

fn default_step_fraction() -> f64 {
    0.1
}

fn default_family_swap_probability() -> f64 {
    0.4
}

fn default_parents_per_child() -> usize {
    2
}

fn default_trials_per_candidate() -> usize {
    8
}
