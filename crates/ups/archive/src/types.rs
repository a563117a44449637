use crate::signature::StructuralSignature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ups_types::{Solution, SolutionId, Tier};

/// Identifier of a diversity cluster within one archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}", self.0)
    }
}

/// An archived solution plus the state derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub solution: Solution,
    /// Aggregate score under the evaluator's aggregation policy.
    pub score: f64,
    /// Refreshed whenever the score distribution changes.
    pub tier: Tier,
    pub cluster: ClusterId,
    /// Mean distance to the nearest centroids at insertion time.
    pub novelty: f64,
    pub signature: StructuralSignature,
    /// Insertion sequence number; older entries have smaller values.
    pub seq: u64,
}

impl ArchiveEntry {
    pub fn id(&self) -> SolutionId {
        self.solution.id
    }
}

/// A group of structurally similar solutions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Founder's family and components; fingerprint is the members' mean.
    pub centroid: StructuralSignature,
    pub population: usize,
}

/// Serialisable archive overview.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub size: usize,
    pub capacity: usize,
    pub cluster_count: usize,
    pub tier_counts: BTreeMap<Tier, usize>,
    pub inserted: u64,
    pub pruned: u64,
    pub best_id: Option<SolutionId>,
    pub best_score: Option<f64>,
}
