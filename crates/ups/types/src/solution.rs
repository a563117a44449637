use crate::genome::Genome;
use crate::ids::SolutionId;
use crate::scoring::{metrics_valid, Metrics};
use crate::strategy::StrategyKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a solution came into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Produced by the solution generator before evolution started.
    Baseline,
    /// Produced by one of the mutation strategies.
    Strategy(StrategyKind),
}

impl Origin {
    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            Origin::Baseline => None,
            Origin::Strategy(k) => Some(*k),
        }
    }
}

/// Free-form metadata attached to a solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionMetadata {
    /// Structural description (algorithm family, components, parameters).
    pub genome: Genome,
    pub origin: Origin,
    /// Generation in which the solution was proposed (0 for the baseline).
    pub generation: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

/// One candidate: executable artifact, side artifacts, metrics, metadata and
/// derivation history.
///
/// Solutions are never edited in place. Evaluation produces a new value via
/// [`Solution::with_metrics`]; mutation produces a new solution with a fresh id
/// via [`Solution::derive`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    /// Opaque executable artifact.
    pub code: String,
    #[serde(default)]
    pub artifacts: BTreeMap<String, Vec<u8>>,
    #[serde(default)]
    pub metrics: Metrics,
    pub metadata: SolutionMetadata,
    /// Ancestor ids, oldest first; the direct parents are last.
    #[serde(default)]
    pub lineage: Vec<SolutionId>,
}

impl Solution {
    /// A root solution with no ancestors.
    pub fn baseline(code: impl Into<String>, genome: Genome) -> Self {
        Self {
            id: SolutionId::generate(),
            code: code.into(),
            artifacts: BTreeMap::new(),
            metrics: Metrics::new(),
            metadata: SolutionMetadata {
                genome,
                origin: Origin::Baseline,
                generation: 0,
                created_at: Utc::now(),
                notes: BTreeMap::new(),
            },
            lineage: Vec::new(),
        }
    }

    /// A new, unevaluated child of `parents`.
    ///
    /// The lineage extends the first parent's lineage with every direct
    /// parent id, without duplicates.
    pub fn derive(
        id: SolutionId,
        parents: &[&Solution],
        genome: Genome,
        code: impl Into<String>,
        kind: StrategyKind,
        generation: u64,
    ) -> Self {
        let mut lineage: Vec<SolutionId> = parents
            .first()
            .map(|p| p.lineage.clone())
            .unwrap_or_default();
        for parent in parents {
            if !lineage.contains(&parent.id) {
                lineage.push(parent.id);
            }
        }
        Self {
            id,
            code: code.into(),
            artifacts: BTreeMap::new(),
            metrics: Metrics::new(),
            metadata: SolutionMetadata {
                genome,
                origin: Origin::Strategy(kind),
                generation,
                created_at: Utc::now(),
                notes: BTreeMap::new(),
            },
            lineage,
        }
    }

    pub fn with_id(mut self, id: SolutionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, blob: Vec<u8>) -> Self {
        self.artifacts.insert(name.into(), blob);
        self
    }

    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.notes.insert(key.into(), value.into());
        self
    }

    pub fn genome(&self) -> &Genome {
        &self.metadata.genome
    }

    pub fn origin(&self) -> Origin {
        self.metadata.origin
    }

    /// True once valid metrics are attached.
    pub fn is_evaluated(&self) -> bool {
        metrics_valid(&self.metrics)
    }

    /// Direct parents' ids (the tail of the lineage).
    pub fn parent_ids(&self, parent_count: usize) -> &[SolutionId] {
        let start = self.lineage.len().saturating_sub(parent_count);
        &self.lineage[start..]
    }
}
