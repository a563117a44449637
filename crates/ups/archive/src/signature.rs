//! Structural signatures and the pure diversity functions built on them.
//!
//! Everything here is stateless and deterministic: the same archive contents
//! always produce the same clusters and novelty estimates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ups_types::{Genome, ParamValue, SearchSpace};

/// Algorithm family + structural components + normalised parameter
/// fingerprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuralSignature {
    pub family: String,
    pub components: BTreeMap<String, String>,
    /// Parameter name → position in [0, 1].
    pub fingerprint: BTreeMap<String, f64>,
}

impl StructuralSignature {
    pub fn from_genome(genome: &Genome, space: &SearchSpace) -> Self {
        let fingerprint = genome
            .parameters
            .iter()
            .map(|(name, value)| {
                let x = space
                    .param_spec(&genome.family, name)
                    .and_then(|spec| spec.normalize(value))
                    .unwrap_or_else(|| undeclared_position(value));
                (name.clone(), x)
            })
            .collect();
        Self {
            family: genome.family.clone(),
            components: genome.components.clone(),
            fingerprint,
        }
    }
}

/// Parameters outside the declared space still need a stable position.
fn undeclared_position(value: &ParamValue) -> f64 {
    match value {
        ParamValue::Float(v) => squash(*v),
        ParamValue::Int(v) => squash(*v as f64),
        ParamValue::Choice(c) => {
            // FNV-1a, folded into [0, 1].
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in c.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            (hash % 10_000) as f64 / 9_999.0
        }
    }
}

fn squash(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.5;
    }
    0.5 + 0.5 * x / (1.0 + x.abs())
}

/// Relative weight of each signature part in [`distance`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceWeights {
    pub family: f64,
    pub components: f64,
    pub parameters: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            family: 0.5,
            components: 0.3,
            parameters: 0.2,
        }
    }
}

/// Structural distance in [0, 1]. Symmetric; zero for identical signatures.
pub fn distance(a: &StructuralSignature, b: &StructuralSignature, w: &DistanceWeights) -> f64 {
    let total = w.family + w.components + w.parameters;
    if total <= 0.0 {
        return 0.0;
    }

    let family = if a.family == b.family { 0.0 } else { 1.0 };

    let slots: BTreeSet<&String> = a.components.keys().chain(b.components.keys()).collect();
    let components = if slots.is_empty() {
        0.0
    } else {
        let differing = slots
            .iter()
            .filter(|slot| a.components.get(**slot) != b.components.get(**slot))
            .count();
        differing as f64 / slots.len() as f64
    };

    let params: BTreeSet<&String> = a.fingerprint.keys().chain(b.fingerprint.keys()).collect();
    let parameters = if params.is_empty() {
        0.0
    } else {
        let sum: f64 = params
            .iter()
            .map(|p| match (a.fingerprint.get(*p), b.fingerprint.get(*p)) {
                (Some(x), Some(y)) => (x - y).abs(),
                _ => 1.0,
            })
            .sum();
        sum / params.len() as f64
    };

    (w.family * family + w.components * components + w.parameters * parameters) / total
}

/// Mean distance to the `k` nearest centroids; 1.0 when there are none.
pub fn novelty(
    signature: &StructuralSignature,
    centroids: &[&StructuralSignature],
    k: usize,
    w: &DistanceWeights,
) -> f64 {
    if centroids.is_empty() || k == 0 {
        return 1.0;
    }
    let mut distances: Vec<f64> = centroids
        .iter()
        .map(|c| distance(signature, c, w))
        .collect();
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let take = k.min(distances.len());
    distances[..take].iter().sum::<f64>() / take as f64
}
