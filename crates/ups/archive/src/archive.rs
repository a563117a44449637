//! Core archive implementation

use crate::config::{ArchiveConfig, TierPercentiles};
use crate::error::ArchiveError;
use crate::selection::{self, SelectionPolicy};
use crate::signature::{distance, novelty, StructuralSignature};
use crate::snapshot::ArchiveSnapshot;
use crate::tiers::TierCutPoints;
use crate::types::{ArchiveEntry, ArchiveSummary, Cluster, ClusterId};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use ups_types::{AggregationPolicy, Metrics, SearchSpace, Solution, SolutionId, StrategyKind, Tier};

/// Population store for one evolution run.
///
/// Owns every entry exclusively. Mutation goes through [`Archive::add`], which
/// takes `&mut self`, so there is exactly one writer at a time; concurrent
/// readers work on an [`ArchiveSnapshot`].
#[derive(Debug)]
pub struct Archive {
    config: ArchiveConfig,
    space: Arc<SearchSpace>,
    policy: AggregationPolicy,
    /// Insertion order.
    entries: Vec<ArchiveEntry>,
    clusters: Vec<Cluster>,
    next_cluster: u64,
    next_seq: u64,
    /// Highest-scoring entry; never pruned.
    best: Option<SolutionId>,
    inserted: u64,
    pruned: u64,
}

impl Archive {
    pub fn new(
        config: ArchiveConfig,
        space: SearchSpace,
        policy: AggregationPolicy,
    ) -> Result<Self, ArchiveError> {
        config.validate()?;
        Ok(Self {
            config,
            space: Arc::new(space),
            policy,
            entries: Vec::new(),
            clusters: Vec::new(),
            next_cluster: 0,
            next_seq: 0,
            best: None,
            inserted: 0,
            pruned: 0,
        })
    }

    /// Archive an evaluated solution.
    ///
    /// Computes the aggregate score, assigns a diversity cluster, inserts, and
    /// prunes back to capacity. The returned entry reflects the state at
    /// insertion, even if the entry itself was pruned straight away.
    pub fn add(&mut self, solution: Solution, metrics: Metrics) -> Result<ArchiveEntry, ArchiveError> {
        let id = solution.id;
        if metrics.is_empty() {
            return Err(ArchiveError::EmptyMetrics(id));
        }
        if let Some((name, _)) = metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ArchiveError::InvalidMetric {
                id,
                metric: name.clone(),
            });
        }
        if self.contains(id) {
            return Err(ArchiveError::Duplicate(id));
        }

        let solution = solution.with_metrics(metrics);
        let score = self.policy.aggregate(&solution.metrics);
        let signature = StructuralSignature::from_genome(solution.genome(), &self.space);
        let novelty = {
            let centroids: Vec<&StructuralSignature> =
                self.clusters.iter().map(|c| &c.centroid).collect();
            novelty(
                &signature,
                &centroids,
                self.config.novelty_k,
                &self.config.distance_weights,
            )
        };
        let cluster = self.assign_cluster(&signature);
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = ArchiveEntry {
            solution,
            score,
            tier: Tier::Exploratory,
            cluster,
            novelty,
            signature,
            seq,
        };
        let created = entry.clone();
        self.entries.push(entry);
        self.inserted += 1;

        if self.best_score().map_or(true, |best| score > best) {
            self.best = Some(id);
        }

        while self.entries.len() > self.config.capacity {
            match self.prune_one() {
                Some(victim) => tracing::debug!(
                    solution_id = %victim.id(),
                    score = victim.score,
                    cluster = %victim.cluster,
                    "pruned archive entry"
                ),
                None => break,
            }
        }
        self.refresh();

        tracing::debug!(
            solution_id = %id,
            score,
            cluster = %cluster,
            novelty,
            size = self.entries.len(),
            "archived solution"
        );

        Ok(self.get(id).cloned().unwrap_or(created))
    }

    /// Sample parents with the policy appropriate for `strategy`.
    pub fn select_parents<R: Rng + ?Sized>(
        &self,
        strategy: StrategyKind,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<&ArchiveEntry>, ArchiveError> {
        selection::sample(&self.entries, SelectionPolicy::for_strategy(strategy), k, rng)
    }

    /// Entries grouped by tier, recomputed from the current score distribution.
    pub fn tiers(&self) -> BTreeMap<Tier, Vec<ArchiveEntry>> {
        group_by_tier(&self.entries, &self.config.tier_percentiles)
    }

    /// Read-only copy for concurrent strategy consumption.
    pub fn snapshot(&self) -> ArchiveSnapshot {
        ArchiveSnapshot::new(
            self.entries.clone(),
            self.clusters.clone(),
            self.best,
            self.space.clone(),
            self.config.clone(),
        )
    }

    pub fn summary(&self) -> ArchiveSummary {
        let mut tier_counts: BTreeMap<Tier, usize> = Tier::ALL.iter().map(|t| (*t, 0)).collect();
        for e in &self.entries {
            *tier_counts.entry(e.tier).or_default() += 1;
        }
        ArchiveSummary {
            size: self.entries.len(),
            capacity: self.config.capacity,
            cluster_count: self.clusters.len(),
            tier_counts,
            inserted: self.inserted,
            pruned: self.pruned,
            best_id: self.best,
            best_score: self.best_score(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn contains(&self, id: SolutionId) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    pub fn get(&self, id: SolutionId) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn best(&self) -> Option<&ArchiveEntry> {
        self.best.and_then(|id| self.get(id))
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best().map(|e| e.score)
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Nearest cluster within the threshold, or a freshly founded one.
    fn assign_cluster(&mut self, signature: &StructuralSignature) -> ClusterId {
        let weights = self.config.distance_weights;
        let nearest = self
            .clusters
            .iter()
            .map(|c| (c.id, distance(signature, &c.centroid, &weights)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        match nearest {
            Some((id, d)) if d <= self.config.cluster_threshold => id,
            _ => {
                let id = ClusterId(self.next_cluster);
                self.next_cluster += 1;
                self.clusters.push(Cluster {
                    id,
                    centroid: signature.clone(),
                    population: 0,
                });
                id
            }
        }
    }

    /// Remove the lowest-scoring non-best entry of the most populated cluster.
    fn prune_one(&mut self) -> Option<ArchiveEntry> {
        let mut counts: BTreeMap<ClusterId, usize> = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.cluster).or_default() += 1;
        }
        let mut order: Vec<(ClusterId, usize)> = counts.into_iter().collect();
        order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (cluster, _) in order {
            let victim = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.cluster == cluster && Some(e.id()) != self.best)
                .min_by(|(_, a), (_, b)| {
                    a.score
                        .partial_cmp(&b.score)
                        .unwrap_or(Ordering::Equal)
                        .then(a.seq.cmp(&b.seq))
                })
                .map(|(i, _)| i);
            if let Some(i) = victim {
                self.pruned += 1;
                return Some(self.entries.remove(i));
            }
        }
        None
    }

    /// Recompute cluster populations, centroids and entry tiers.
    fn refresh(&mut self) {
        for cluster in &mut self.clusters {
            let members: Vec<&ArchiveEntry> =
                self.entries.iter().filter(|e| e.cluster == cluster.id).collect();
            cluster.population = members.len();
            if members.is_empty() {
                continue;
            }
            let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
            for m in &members {
                for (name, x) in &m.signature.fingerprint {
                    let slot = sums.entry(name.clone()).or_insert((0.0, 0));
                    slot.0 += x;
                    slot.1 += 1;
                }
            }
            cluster.centroid.fingerprint = sums
                .into_iter()
                .map(|(name, (sum, n))| (name, sum / n as f64))
                .collect();
        }
        self.clusters.retain(|c| c.population > 0);

        let scores: Vec<f64> = self.entries.iter().map(|e| e.score).collect();
        if let Some(cuts) = TierCutPoints::compute(&scores, &self.config.tier_percentiles) {
            for e in &mut self.entries {
                e.tier = cuts.tier_of(e.score);
            }
        }
    }
}

pub(crate) fn group_by_tier(
    entries: &[ArchiveEntry],
    percentiles: &TierPercentiles,
) -> BTreeMap<Tier, Vec<ArchiveEntry>> {
    let mut tiers: BTreeMap<Tier, Vec<ArchiveEntry>> =
        Tier::ALL.iter().map(|t| (*t, Vec::new())).collect();
    let scores: Vec<f64> = entries.iter().map(|e| e.score).collect();
    if let Some(cuts) = TierCutPoints::compute(&scores, percentiles) {
        for e in entries {
            let mut entry = e.clone();
            entry.tier = cuts.tier_of(e.score);
            tiers.entry(entry.tier).or_default().push(entry);
        }
    }
    tiers
}
