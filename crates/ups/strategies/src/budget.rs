use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use ups_types::StrategyKind;

/// Resource budget for one strategy invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyBudget {
    pub max_candidates: usize,
    /// Soft limit; a strategy stops proposing once it has elapsed and
    /// returns what it has.
    pub time_limit: Duration,
}

impl StrategyBudget {
    pub fn new(max_candidates: usize, time_limit: Duration) -> Self {
        Self {
            max_candidates,
            time_limit,
        }
    }
}

/// Split `total` candidates across the strategies keyed in `shares`, in
/// proportion to their share.
///
/// Every strategy present gets at least one candidate; the remainder is
/// distributed by largest-remainder rounding, ties broken in dispatch order.
/// The result sums to `max(total, shares.len())`.
pub fn split_candidates(
    total: usize,
    shares: &BTreeMap<StrategyKind, f64>,
) -> BTreeMap<StrategyKind, usize> {
    let floor = shares.len();
    let spare = total.saturating_sub(floor);
    let share_sum: f64 = shares.values().map(|v| v.max(0.0)).sum();

    let mut counts: BTreeMap<StrategyKind, usize> = BTreeMap::new();
    let mut remainders: Vec<(StrategyKind, f64)> = Vec::with_capacity(floor);
    let mut assigned = 0;
    for (&kind, &raw) in shares {
        let share = if share_sum > 0.0 {
            raw.max(0.0) / share_sum
        } else {
            1.0 / floor as f64
        };
        let exact = share * spare as f64;
        let whole = exact.floor() as usize;
        counts.insert(kind, 1 + whole);
        assigned += whole;
        remainders.push((kind, exact - whole as f64));
    }

    // Stable sort keeps dispatch order among equal remainders.
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (kind, _) in remainders.into_iter().take(spare.saturating_sub(assigned)) {
        if let Some(c) = counts.get_mut(&kind) {
            *c += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shares(v: [f64; 4]) -> BTreeMap<StrategyKind, f64> {
        StrategyKind::ALL.iter().copied().zip(v).collect()
    }

    #[test]
    fn split_sums_to_total() {
        let counts = split_candidates(20, &shares([0.25, 0.35, 0.25, 0.15]));
        assert_eq!(counts.values().sum::<usize>(), 20);
        assert!(counts.values().all(|c| *c >= 1));
    }

    #[test]
    fn split_follows_shares() {
        let counts = split_candidates(24, &shares([0.6, 0.2, 0.1, 0.1]));
        assert!(counts[&StrategyKind::LocalOptimization] > counts[&StrategyKind::Crossover]);
    }

    #[test]
    fn small_total_still_gives_everyone_one() {
        let counts = split_candidates(2, &shares([0.7, 0.1, 0.1, 0.1]));
        assert!(counts.values().all(|c| *c == 1));
    }

    #[test]
    fn zero_shares_split_evenly() {
        let counts = split_candidates(8, &shares([0.0; 4]));
        assert!(counts.values().all(|c| *c == 2));
    }

    #[test]
    fn subset_receives_the_whole_total() {
        let shares = BTreeMap::from([(StrategyKind::LocalOptimization, 1.0)]);
        let counts = split_candidates(20, &shares);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&StrategyKind::LocalOptimization], 20);
    }
}
