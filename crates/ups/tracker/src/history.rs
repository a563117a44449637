use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ups_types::{SolutionId, StrategyKind};

/// What became of one strategy attempt or candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Scored { score: f64, improved: bool },
    Empty,
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub generation: u64,
    pub strategy: StrategyKind,
    pub solution_id: Option<SolutionId>,
    pub outcome: AttemptOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// A generation whose best-score jump exceeded the breakthrough delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakthrough {
    pub generation: u64,
    pub previous_score: f64,
    pub new_score: f64,
    pub strategy: Option<StrategyKind>,
    pub solution_id: Option<SolutionId>,
}

impl Breakthrough {
    pub fn delta(&self) -> f64 {
        self.new_score - self.previous_score
    }
}

/// Bounded ring of attempt records; the oldest fall off first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AttemptHistory {
    records: VecDeque<AttemptRecord>,
    capacity: usize,
}

impl AttemptHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, record: AttemptRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.records.iter()
    }

    pub fn for_strategy(&self, kind: StrategyKind) -> impl Iterator<Item = &AttemptRecord> {
        self.records.iter().filter(move |r| r.strategy == kind)
    }
}
