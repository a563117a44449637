//! Pure allocation math: softmax over effectiveness, then bounded
//! redistribution so every share lies in `[floor, ceiling]` and all shares sum
//! to one.

use std::collections::BTreeMap;
use ups_types::StrategyKind;

/// `share_i ∝ prior_i · exp(effectiveness_i / temperature)`, normalised.
///
/// Only `kinds` receive a share. Missing priors count as uniform; missing
/// effectiveness as zero.
pub fn softmax_shares(
    kinds: &[StrategyKind],
    priors: &BTreeMap<StrategyKind, f64>,
    effectiveness: &BTreeMap<StrategyKind, f64>,
    temperature: f64,
) -> BTreeMap<StrategyKind, f64> {
    let n = kinds.len() as f64;
    let prior_sum: f64 = kinds
        .iter()
        .map(|k| priors.get(k).copied().unwrap_or(0.0))
        .sum();
    let prior = |k: &StrategyKind| {
        if prior_sum > 0.0 {
            priors.get(k).copied().unwrap_or(0.0) / prior_sum
        } else {
            1.0 / n
        }
    };
    let t = if temperature > 0.0 { temperature } else { 1.0 };

    let eff = |k: &StrategyKind| {
        let e = effectiveness.get(k).copied().unwrap_or(0.0);
        if e.is_finite() {
            e
        } else {
            0.0
        }
    };
    // Subtract the maximum to keep exp() in range.
    let max = kinds
        .iter()
        .map(|k| eff(k))
        .fold(f64::NEG_INFINITY, f64::max);

    let raw: BTreeMap<StrategyKind, f64> = kinds
        .iter()
        .map(|k| (*k, prior(k) * ((eff(k) - max) / t).exp()))
        .collect();
    let total: f64 = raw.values().sum();
    if total > 0.0 && total.is_finite() {
        raw.into_iter().map(|(k, v)| (k, v / total)).collect()
    } else {
        kinds.iter().map(|k| (*k, 1.0 / n)).collect()
    }
}

/// Clamp `shares` into `[floor, ceiling]` while keeping their sum at one.
///
/// Entries that violate a bound are pinned to it and the rest are rescaled
/// over the remaining mass; repeated until nothing violates. Requires
/// `n * floor <= 1 <= n * ceiling`; for fewer strategies the bounds are
/// widened to `1 / n`.
pub fn clamp_shares(
    kinds: &[StrategyKind],
    shares: &BTreeMap<StrategyKind, f64>,
    floor: f64,
    ceiling: f64,
) -> BTreeMap<StrategyKind, f64> {
    if kinds.is_empty() {
        return BTreeMap::new();
    }
    let even = 1.0 / kinds.len() as f64;
    let floor = floor.min(even);
    let ceiling = ceiling.max(even);

    let mut pinned: BTreeMap<StrategyKind, f64> = BTreeMap::new();
    let mut result: BTreeMap<StrategyKind, f64> = BTreeMap::new();

    for _ in 0..=kinds.len() {
        let free: Vec<StrategyKind> = kinds
            .iter()
            .copied()
            .filter(|k| !pinned.contains_key(k))
            .collect();
        let free_mass = 1.0 - pinned.values().sum::<f64>();
        let free_sum: f64 = free
            .iter()
            .map(|k| shares.get(k).copied().unwrap_or(0.0).max(0.0))
            .sum();

        let scaled: BTreeMap<StrategyKind, f64> = free
            .iter()
            .map(|k| {
                let v = if free_sum > 0.0 {
                    shares.get(k).copied().unwrap_or(0.0).max(0.0) / free_sum * free_mass
                } else {
                    free_mass / free.len() as f64
                };
                (*k, v)
            })
            .collect();

        let below: Vec<StrategyKind> = scaled
            .iter()
            .filter(|(_, v)| **v < floor)
            .map(|(k, _)| *k)
            .collect();
        if !below.is_empty() {
            for k in below {
                pinned.insert(k, floor);
            }
            continue;
        }
        let above: Vec<StrategyKind> = scaled
            .iter()
            .filter(|(_, v)| **v > ceiling)
            .map(|(k, _)| *k)
            .collect();
        if !above.is_empty() {
            for k in above {
                pinned.insert(k, ceiling);
            }
            continue;
        }

        result = pinned.clone();
        result.extend(scaled);
        break;
    }
    if result.len() < kinds.len() {
        result = pinned;
    }

    settle_residual(&mut result, floor, ceiling, kinds.len());
    result
}

/// Push any rounding residual into entries that still have room.
fn settle_residual(shares: &mut BTreeMap<StrategyKind, f64>, floor: f64, ceiling: f64, rounds: usize) {
    for _ in 0..rounds {
        let residual = 1.0 - shares.values().sum::<f64>();
        if residual.abs() <= 1e-12 {
            return;
        }
        let room: Vec<(StrategyKind, f64)> = shares
            .iter()
            .map(|(k, v)| {
                let r = if residual > 0.0 { ceiling - v } else { v - floor };
                (*k, r.max(0.0))
            })
            .filter(|(_, r)| *r > 0.0)
            .collect();
        let total_room: f64 = room.iter().map(|(_, r)| r).sum();
        if total_room <= 0.0 {
            return;
        }
        let moved = residual.abs().min(total_room);
        for (k, r) in room {
            if let Some(v) = shares.get_mut(&k) {
                let step = moved * r / total_room;
                *v += if residual > 0.0 { step } else { -step };
            }
        }
    }
}
