//! Performance tracker and convergence monitor

use crate::allocation::{clamp_shares, softmax_shares};
use crate::config::{AllocationConfig, ConvergenceConfig, RunLimits, TrackerConfig};
use crate::error::TrackerError;
use crate::history::{AttemptHistory, AttemptOutcome, AttemptRecord, Breakthrough};
use crate::report::{EvolutionReport, StrategyStanding};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use ups_types::{CancellationHandle, SolutionId, StrategyKind};

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    Converged,
    BudgetExhausted,
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::Converged => "CONVERGED",
            TerminationReason::BudgetExhausted => "BUDGET_EXHAUSTED",
            TerminationReason::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDecision {
    pub reason: TerminationReason,
    pub detail: String,
}

impl StopDecision {
    fn new(reason: TerminationReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Running counters for one strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub attempts: u64,
    pub candidates: u64,
    pub failures: u64,
    pub improvements: u64,
    pub last_observation: f64,
}

/// Consumes per-strategy results, maintains effectiveness scores and the
/// improvement window, recommends resource shares and decides when to stop.
#[derive(Debug)]
pub struct PerformanceTracker {
    config: TrackerConfig,
    allocation: AllocationConfig,
    convergence: ConvergenceConfig,
    limits: RunLimits,
    cancel: CancellationHandle,
    started_at: Instant,
    /// Strategies that receive an allocation.
    active: Vec<StrategyKind>,

    effectiveness: BTreeMap<StrategyKind, f64>,
    stats: BTreeMap<StrategyKind, StrategyStats>,
    /// Best-score delta of each of the most recent generations.
    window: VecDeque<f64>,
    history: AttemptHistory,
    breakthroughs: Vec<Breakthrough>,

    baseline_score: Option<f64>,
    best_score: Option<f64>,
    best_id: Option<SolutionId>,
    best_origin: Option<StrategyKind>,
    /// Best score when the current generation was dispatched.
    incumbent: Option<f64>,
    generations: u64,
    criteria_met: bool,
}

impl PerformanceTracker {
    pub fn new(
        config: TrackerConfig,
        allocation: AllocationConfig,
        convergence: ConvergenceConfig,
        limits: RunLimits,
        cancel: CancellationHandle,
    ) -> Result<Self, TrackerError> {
        config.validate()?;
        allocation.validate()?;
        convergence.validate()?;
        let history = AttemptHistory::new(config.history_capacity);
        Ok(Self {
            effectiveness: StrategyKind::ALL.iter().map(|k| (*k, 0.0)).collect(),
            stats: StrategyKind::ALL
                .iter()
                .map(|k| (*k, StrategyStats::default()))
                .collect(),
            window: VecDeque::with_capacity(convergence.window),
            history,
            breakthroughs: Vec::new(),
            baseline_score: None,
            best_score: None,
            best_id: None,
            best_origin: None,
            incumbent: None,
            generations: 0,
            criteria_met: false,
            started_at: Instant::now(),
            active: StrategyKind::ALL.to_vec(),
            config,
            allocation,
            convergence,
            limits,
            cancel,
        })
    }

    /// Seed the incumbent with the archived baseline.
    pub fn set_baseline(&mut self, id: SolutionId, score: f64) {
        self.baseline_score = Some(score);
        self.best_score = Some(score);
        self.best_id = Some(id);
        self.best_origin = None;
        self.incumbent = Some(score);
    }

    /// Record one strategy's evaluated candidates for `generation`.
    ///
    /// `evaluation_failures` counts candidates that could not be scored. The
    /// effectiveness observation is the improvement of the best candidate over
    /// the incumbent at dispatch time (never negative); a strategy whose every
    /// candidate failed is treated as a failed attempt. Returns the observation.
    pub fn record(
        &mut self,
        strategy: StrategyKind,
        generation: u64,
        scored: &[(SolutionId, f64)],
        evaluation_failures: usize,
    ) -> f64 {
        for (id, score) in scored {
            let improved = self.best_score.map_or(true, |best| *score > best);
            if improved {
                self.best_score = Some(*score);
                self.best_id = Some(*id);
                self.best_origin = Some(strategy);
            }
            self.push_history(
                strategy,
                generation,
                Some(*id),
                AttemptOutcome::Scored {
                    score: *score,
                    improved,
                },
            );
            if improved {
                self.stat(strategy).improvements += 1;
            }
        }

        let observation = if let Some(best_candidate) =
            scored.iter().map(|(_, s)| *s).reduce(f64::max)
        {
            match self.incumbent {
                Some(incumbent) => (best_candidate - incumbent).max(0.0),
                None => 0.0,
            }
        } else if evaluation_failures > 0 {
            -self.config.failure_penalty
        } else {
            self.push_history(strategy, generation, None, AttemptOutcome::Empty);
            0.0
        };

        let stats = self.stat(strategy);
        stats.attempts += 1;
        stats.candidates += (scored.len() + evaluation_failures) as u64;
        stats.failures += evaluation_failures as u64;
        stats.last_observation = observation;
        let effectiveness = self.update_effectiveness(strategy, observation);

        tracing::debug!(
            strategy = %strategy,
            generation,
            scored = scored.len(),
            evaluation_failures,
            observation,
            effectiveness,
            "strategy result recorded"
        );
        observation
    }

    /// Record a strategy attempt that produced nothing because it failed
    /// (error or timeout).
    pub fn record_failure(&mut self, strategy: StrategyKind, generation: u64, reason: &str) -> f64 {
        let observation = -self.config.failure_penalty;
        self.push_history(
            strategy,
            generation,
            None,
            AttemptOutcome::Failed {
                reason: reason.to_string(),
            },
        );
        let stats = self.stat(strategy);
        stats.attempts += 1;
        stats.failures += 1;
        stats.last_observation = observation;
        let effectiveness = self.update_effectiveness(strategy, observation);
        tracing::warn!(strategy = %strategy, generation, reason, effectiveness, "strategy attempt failed");
        observation
    }

    /// Close `generation`: push its best-score delta into the window and log
    /// breakthroughs. Returns the delta.
    pub fn end_generation(&mut self, generation: u64) -> f64 {
        let delta = match (self.incumbent, self.best_score) {
            (Some(before), Some(after)) => (after - before).max(0.0),
            _ => 0.0,
        };
        if self.window.len() == self.convergence.window {
            self.window.pop_front();
        }
        self.window.push_back(delta);

        if delta > self.config.breakthrough_delta {
            let breakthrough = Breakthrough {
                generation,
                previous_score: self.incumbent.unwrap_or_default(),
                new_score: self.best_score.unwrap_or_default(),
                strategy: self.best_origin,
                solution_id: self.best_id,
            };
            tracing::info!(
                generation,
                delta,
                strategy = ?breakthrough.strategy,
                "breakthrough"
            );
            self.breakthroughs.push(breakthrough);
        }

        self.incumbent = self.best_score;
        self.generations = generation;
        delta
    }

    /// Restrict allocation to the strategies actually dispatched.
    pub fn set_strategies(&mut self, kinds: &[StrategyKind]) {
        self.active = kinds.to_vec();
    }

    /// Resource share per active strategy; sums to one, each within the
    /// configured floor and ceiling.
    pub fn recommend_allocation(&self) -> BTreeMap<StrategyKind, f64> {
        let raw = softmax_shares(
            &self.active,
            &self.allocation.priors,
            &self.effectiveness,
            self.allocation.temperature,
        );
        clamp_shares(&self.active, &raw, self.allocation.floor, self.allocation.ceiling)
    }

    pub fn should_continue(&self) -> bool {
        self.stop_decision().is_none()
    }

    /// The first stop condition that holds, if any.
    pub fn stop_decision(&self) -> Option<StopDecision> {
        if self.cancel.is_cancelled() {
            return Some(StopDecision::new(
                TerminationReason::Cancelled,
                "cancellation requested",
            ));
        }
        if let (Some(target), Some(best)) = (self.convergence.target_score, self.best_score) {
            if best >= target {
                return Some(StopDecision::new(
                    TerminationReason::Converged,
                    format!("target score {} reached ({})", target, best),
                ));
            }
        }
        if self.convergence.stop_on_success_criteria && self.criteria_met {
            return Some(StopDecision::new(
                TerminationReason::Converged,
                "success criteria met",
            ));
        }
        if let Some(max) = self.limits.max_generations {
            if self.generations >= max {
                return Some(StopDecision::new(
                    TerminationReason::BudgetExhausted,
                    format!("generation budget of {} exhausted", max),
                ));
            }
        }
        if let Some(ms) = self.limits.max_wall_clock_ms {
            if self.elapsed() >= Duration::from_millis(ms) {
                return Some(StopDecision::new(
                    TerminationReason::BudgetExhausted,
                    format!("wall-clock budget of {}ms exhausted", ms),
                ));
            }
        }
        if self.plateaued() {
            return Some(StopDecision::new(
                TerminationReason::Converged,
                format!(
                    "best score improved by less than {} for {} generations",
                    self.convergence.epsilon, self.convergence.window
                ),
            ));
        }
        None
    }

    /// Full window of deltas, all below epsilon.
    pub fn plateaued(&self) -> bool {
        self.window.len() >= self.convergence.window
            && self.window.iter().all(|d| *d < self.convergence.epsilon)
    }

    pub fn set_criteria_met(&mut self, met: bool) {
        self.criteria_met = met;
    }

    pub fn effectiveness(&self) -> &BTreeMap<StrategyKind, f64> {
        &self.effectiveness
    }

    pub fn stats(&self) -> &BTreeMap<StrategyKind, StrategyStats> {
        &self.stats
    }

    pub fn history(&self) -> &AttemptHistory {
        &self.history
    }

    pub fn breakthroughs(&self) -> &[Breakthrough] {
        &self.breakthroughs
    }

    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    pub fn baseline_score(&self) -> Option<f64> {
        self.baseline_score
    }

    pub fn generations(&self) -> u64 {
        self.generations
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn cancellation(&self) -> &CancellationHandle {
        &self.cancel
    }

    pub fn report(&self) -> EvolutionReport {
        let mut strategy_ranking: Vec<StrategyStanding> = StrategyKind::ALL
            .iter()
            .map(|k| {
                let stats = self.stats.get(k).cloned().unwrap_or_default();
                StrategyStanding {
                    strategy: *k,
                    effectiveness: self.effectiveness.get(k).copied().unwrap_or_default(),
                    attempts: stats.attempts,
                    candidates: stats.candidates,
                    failures: stats.failures,
                    improvements: stats.improvements,
                }
            })
            .collect();
        // Stable: equal effectiveness keeps dispatch order.
        strategy_ranking.sort_by(|a, b| {
            b.effectiveness
                .partial_cmp(&a.effectiveness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let improvement_factor = match (self.baseline_score, self.best_score) {
            (Some(base), Some(best)) if base.abs() > f64::EPSILON => Some(best / base),
            _ => None,
        };

        EvolutionReport {
            baseline_score: self.baseline_score,
            final_score: self.best_score,
            improvement_factor,
            generations_completed: self.generations,
            candidates_attempted: self.stats.values().map(|s| s.candidates).sum(),
            successful_improvements: self.stats.values().map(|s| s.improvements).sum(),
            failures: self.stats.values().map(|s| s.failures).sum(),
            breakthroughs: self.breakthroughs.clone(),
            strategy_ranking,
        }
    }

    fn stat(&mut self, strategy: StrategyKind) -> &mut StrategyStats {
        self.stats.entry(strategy).or_default()
    }

    fn update_effectiveness(&mut self, strategy: StrategyKind, observation: f64) -> f64 {
        let alpha = self.config.ewma_alpha;
        let e = self.effectiveness.entry(strategy).or_insert(0.0);
        *e = alpha * observation + (1.0 - alpha) * *e;
        *e
    }

    fn push_history(
        &mut self,
        strategy: StrategyKind,
        generation: u64,
        solution_id: Option<SolutionId>,
        outcome: AttemptOutcome,
    ) {
        self.history.push(AttemptRecord {
            generation,
            strategy,
            solution_id,
            outcome,
            recorded_at: Utc::now(),
        });
    }
}
