use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metric name → measured value.
pub type Metrics = BTreeMap<String, f64>;

/// A metrics map is usable for archiving when it is non-empty and every value
/// is finite.
pub fn metrics_valid(metrics: &Metrics) -> bool {
    !metrics.is_empty() && metrics.values().all(|v| v.is_finite())
}

/// Problem-specific weighted combination of metrics into one aggregate score.
///
/// Higher is better. Metrics listed in `minimize` contribute their negated
/// value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationPolicy {
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub minimize: BTreeSet<String>,
    /// Weight of metrics without an explicit entry.
    #[serde(default = "default_weight")]
    pub default_weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl AggregationPolicy {
    /// Every metric counts equally.
    pub fn uniform() -> Self {
        Self {
            weights: BTreeMap::new(),
            minimize: BTreeSet::new(),
            default_weight: 1.0,
        }
    }

    /// Only the listed metrics count.
    pub fn weighted(weights: impl IntoIterator<Item = (impl Into<String>, f64)>) -> Self {
        Self {
            weights: weights.into_iter().map(|(k, w)| (k.into(), w)).collect(),
            minimize: BTreeSet::new(),
            default_weight: 0.0,
        }
    }

    pub fn with_minimized(mut self, metric: impl Into<String>) -> Self {
        self.minimize.insert(metric.into());
        self
    }

    pub fn weight_of(&self, metric: &str) -> f64 {
        self.weights
            .get(metric)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Weighted mean of the metrics. Zero when no metric carries weight.
    pub fn aggregate(&self, metrics: &Metrics) -> f64 {
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        for (name, value) in metrics {
            let w = self.weight_of(name);
            if w <= 0.0 || !value.is_finite() {
                continue;
            }
            let v = if self.minimize.contains(name) { -value } else { *value };
            total += w * v;
            weight_sum += w;
        }
        if weight_sum == 0.0 {
            0.0
        } else {
            total / weight_sum
        }
    }
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::uniform()
    }
}
