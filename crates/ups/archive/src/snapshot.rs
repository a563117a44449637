use crate::archive::group_by_tier;
use crate::config::ArchiveConfig;
use crate::error::ArchiveError;
use crate::selection::{self, SelectionPolicy};
use crate::signature::{novelty, DistanceWeights, StructuralSignature};
use crate::types::{ArchiveEntry, Cluster, ClusterId};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use ups_types::{Genome, SearchSpace, SolutionId, StrategyKind, Tier};

/// Immutable, cheaply clonable view of the archive at one instant.
///
/// Strategies running concurrently each hold a clone; none of them can
/// observe inserts made after the snapshot was taken.
#[derive(Clone, Debug)]
pub struct ArchiveSnapshot {
    inner: Arc<SnapshotInner>,
}

#[derive(Debug)]
struct SnapshotInner {
    entries: Vec<ArchiveEntry>,
    clusters: Vec<Cluster>,
    best: Option<SolutionId>,
    space: Arc<SearchSpace>,
    config: ArchiveConfig,
}

impl ArchiveSnapshot {
    pub(crate) fn new(
        entries: Vec<ArchiveEntry>,
        clusters: Vec<Cluster>,
        best: Option<SolutionId>,
        space: Arc<SearchSpace>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SnapshotInner {
                entries,
                clusters,
                best,
                space,
                config,
            }),
        }
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.inner.entries
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn get(&self, id: SolutionId) -> Option<&ArchiveEntry> {
        self.inner.entries.iter().find(|e| e.id() == id)
    }

    pub fn best(&self) -> Option<&ArchiveEntry> {
        self.inner.best.and_then(|id| self.get(id))
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.inner.clusters
    }

    pub fn cluster_population(&self, id: ClusterId) -> usize {
        self.inner
            .clusters
            .iter()
            .find(|c| c.id == id)
            .map_or(0, |c| c.population)
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.inner.space
    }

    pub fn distance_weights(&self) -> &DistanceWeights {
        &self.inner.config.distance_weights
    }

    pub fn select_parents<R: Rng + ?Sized>(
        &self,
        strategy: StrategyKind,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<&ArchiveEntry>, ArchiveError> {
        self.select(SelectionPolicy::for_strategy(strategy), k, rng)
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        policy: SelectionPolicy,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<&ArchiveEntry>, ArchiveError> {
        selection::sample(&self.inner.entries, policy, k, rng)
    }

    pub fn tiers(&self) -> BTreeMap<Tier, Vec<ArchiveEntry>> {
        group_by_tier(&self.inner.entries, &self.inner.config.tier_percentiles)
    }

    /// Algorithm families currently represented.
    pub fn families(&self) -> BTreeSet<&str> {
        self.inner
            .entries
            .iter()
            .map(|e| e.solution.genome().family.as_str())
            .collect()
    }

    pub fn signature_of(&self, genome: &Genome) -> StructuralSignature {
        StructuralSignature::from_genome(genome, &self.inner.space)
    }

    /// Novelty a genome would have if inserted now.
    pub fn novelty_of(&self, genome: &Genome) -> f64 {
        let signature = self.signature_of(genome);
        let centroids: Vec<&StructuralSignature> =
            self.inner.clusters.iter().map(|c| &c.centroid).collect();
        novelty(
            &signature,
            &centroids,
            self.inner.config.novelty_k,
            &self.inner.config.distance_weights,
        )
    }

    /// Whether some archived solution already has exactly this genome.
    pub fn contains_genome(&self, genome: &Genome) -> bool {
        let key = genome.canonical_key();
        self.inner
            .entries
            .iter()
            .any(|e| e.solution.genome().canonical_key() == key)
    }
}
