//! Configuration for the solution archive

use crate::error::ArchiveError;
use crate::signature::DistanceWeights;
use serde::{Deserialize, Serialize};

/// Archive behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Maximum number of retained entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// A solution farther than this from every centroid founds a new cluster
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: f64,

    /// Nearest centroids averaged into the novelty estimate
    #[serde(default = "default_novelty_k")]
    pub novelty_k: usize,

    /// Percentile cut points for tier assignment
    #[serde(default)]
    pub tier_percentiles: TierPercentiles,

    /// Weights of the structural distance
    #[serde(default)]
    pub distance_weights: DistanceWeights,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            cluster_threshold: default_cluster_threshold(),
            novelty_k: default_novelty_k(),
            tier_percentiles: TierPercentiles::default(),
            distance_weights: DistanceWeights::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_cluster_threshold(mut self, threshold: f64) -> Self {
        self.cluster_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.capacity == 0 {
            return Err(ArchiveError::InvalidConfig("capacity must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.cluster_threshold) {
            return Err(ArchiveError::InvalidConfig(format!(
                "cluster_threshold {} outside [0, 1]",
                self.cluster_threshold
            )));
        }
        let w = &self.distance_weights;
        if w.family < 0.0 || w.components < 0.0 || w.parameters < 0.0 {
            return Err(ArchiveError::InvalidConfig("distance weights must be non-negative".into()));
        }
        self.tier_percentiles.validate()
    }
}

/// Percentile cut points (Elite / High / Average).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierPercentiles {
    pub elite: f64,
    pub high: f64,
    pub average: f64,
}

impl Default for TierPercentiles {
    fn default() -> Self {
        Self {
            elite: 0.90,
            high: 0.75,
            average: 0.50,
        }
    }
}

impl TierPercentiles {
    pub fn validate(&self) -> Result<(), ArchiveError> {
        let ordered = 0.0 <= self.average
            && self.average <= self.high
            && self.high <= self.elite
            && self.elite <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(ArchiveError::InvalidConfig(format!(
                "tier percentiles must satisfy 0 <= average <= high <= elite <= 1, got {}/{}/{}",
                self.average, self.high, self.elite
            )))
        }
    }
}

fn default_capacity() -> usize {
    100
}

fn default_cluster_threshold() -> f64 {
    0.3
}

fn default_novelty_k() -> usize {
    3
}
