use crate::error::ArchiveError;
use crate::types::{ArchiveEntry, ClusterId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ups_types::StrategyKind;

/// How parents are sampled from the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Probability proportional to tier rank; Elite favoured.
    PerformanceWeighted,
    /// Probability inversely proportional to cluster population.
    DiversityWeighted,
}

impl SelectionPolicy {
    pub fn for_strategy(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Crossover => SelectionPolicy::DiversityWeighted,
            _ => SelectionPolicy::PerformanceWeighted,
        }
    }
}

/// Sample `min(k, entries.len())` distinct entries without replacement.
pub(crate) fn sample<'a, R: Rng + ?Sized>(
    entries: &'a [ArchiveEntry],
    policy: SelectionPolicy,
    k: usize,
    rng: &mut R,
) -> Result<Vec<&'a ArchiveEntry>, ArchiveError> {
    if entries.is_empty() {
        return Err(ArchiveError::Empty);
    }
    let amount = k.min(entries.len());
    if amount == 0 {
        return Ok(Vec::new());
    }

    let mut population: BTreeMap<ClusterId, usize> = BTreeMap::new();
    for e in entries {
        *population.entry(e.cluster).or_default() += 1;
    }

    let chosen = entries
        .choose_multiple_weighted(rng, amount, |e| match policy {
            SelectionPolicy::PerformanceWeighted => e.tier.rank_weight(),
            SelectionPolicy::DiversityWeighted => {
                1.0 / population.get(&e.cluster).copied().unwrap_or(1).max(1) as f64
            }
        })
        .map_err(|e| ArchiveError::Sampling(e.to_string()))?;
    Ok(chosen.collect())
}
