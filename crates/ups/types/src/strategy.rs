use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of mutation strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    LocalOptimization,
    StructuralChange,
    Crossover,
    NoveltySearch,
}

impl StrategyKind {
    /// Fixed dispatch order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::LocalOptimization,
        StrategyKind::StructuralChange,
        StrategyKind::Crossover,
        StrategyKind::NoveltySearch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::LocalOptimization => "local_optimization",
            StrategyKind::StructuralChange => "structural_change",
            StrategyKind::Crossover => "crossover",
            StrategyKind::NoveltySearch => "novelty_search",
        }
    }

    /// Position in [`StrategyKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            StrategyKind::LocalOptimization => 0,
            StrategyKind::StructuralChange => 1,
            StrategyKind::Crossover => 2,
            StrategyKind::NoveltySearch => 3,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Performance-rank bucket, recomputed from the current score distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Elite,
    High,
    Average,
    Exploratory,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Elite, Tier::High, Tier::Average, Tier::Exploratory];

    /// Sampling weight used by performance-weighted parent selection.
    pub fn rank_weight(&self) -> f64 {
        match self {
            Tier::Elite => 4.0,
            Tier::High => 3.0,
            Tier::Average => 2.0,
            Tier::Exploratory => 1.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Elite => "elite",
            Tier::High => "high",
            Tier::Average => "average",
            Tier::Exploratory => "exploratory",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_dispatch_order() {
        for (i, k) in StrategyKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }

    #[test]
    fn elite_weighs_most() {
        assert!(Tier::Elite.rank_weight() > Tier::High.rank_weight());
        assert!(Tier::Average.rank_weight() > Tier::Exploratory.rank_weight());
    }

    #[test]
    fn kind_serde_snake_case() {
        let json = serde_json::to_string(&StrategyKind::NoveltySearch).unwrap();
        assert_eq!(json, "\"novelty_search\"");
    }
}
