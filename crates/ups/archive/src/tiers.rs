use crate::config::TierPercentiles;
use serde::{Deserialize, Serialize};
use ups_types::Tier;

/// Score thresholds derived from the current score distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierCutPoints {
    pub elite: f64,
    pub high: f64,
    pub average: f64,
}

impl TierCutPoints {
    /// Nearest-rank percentiles over `scores`. `None` when there are no scores.
    pub fn compute(scores: &[f64], percentiles: &TierPercentiles) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self {
            elite: nearest_rank(&sorted, percentiles.elite),
            high: nearest_rank(&sorted, percentiles.high),
            average: nearest_rank(&sorted, percentiles.average),
        })
    }

    pub fn tier_of(&self, score: f64) -> Tier {
        if score >= self.elite {
            Tier::Elite
        } else if score >= self.high {
            Tier::High
        } else if score >= self.average {
            Tier::Average
        } else {
            Tier::Exploratory
        }
    }
}

fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}
