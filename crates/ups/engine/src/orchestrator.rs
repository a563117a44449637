//! Evolution Orchestrator - drives the generation loop
//!
//! Each generation allocates a candidate budget across strategies, dispatches
//! them concurrently against an immutable archive snapshot, evaluates their
//! proposals under a global concurrency limit, and commits the results to the
//! archive and tracker. Generation N+1 is dispatched only after every task of
//! generation N has settled and been committed.

use crate::config::EvolutionConfig;
use crate::error::EngineError;
use crate::evaluators;
use crate::outcome::{EvaluationTiming, EvolutionOutcome, GenerationReport, StrategyOutcome};
use crate::sink::StateSink;
use crate::state::{CurrentBest, EvolutionState, RunPhase, StateSnapshot};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use ups_archive::{Archive, ArchiveSnapshot};
use ups_strategies::{split_candidates, MutationStrategy, StrategyBudget, StrategyContext, StrategyError};
use ups_tracker::{PerformanceTracker, StopDecision, TerminationReason};
use ups_types::{
    CancellationHandle, EvaluationError, Evaluator, Metrics, Problem, RunId, Solution,
    SolutionGenerator, StrategyKind, Synthesizer,
};

/// Evolution Orchestrator
pub struct EvolutionOrchestrator {
    /// Produces the baseline (Mode 1)
    generator: Arc<dyn SolutionGenerator>,
    /// Scores every candidate
    evaluator: Arc<dyn Evaluator>,
    /// Renders strategy genomes into code
    synthesizer: Arc<dyn Synthesizer>,
    config: EvolutionConfig,
    /// Dispatch order is the order of this list
    strategies: Vec<MutationStrategy>,
    /// Receives one snapshot per completed generation
    sink: Option<Arc<dyn StateSink>>,
    /// Latest snapshot for monitors
    snapshot_tx: watch::Sender<Option<StateSnapshot>>,
    cancel: CancellationHandle,
}

/// Proposals and evaluations of one generation, before commit.
struct SettledGeneration {
    proposals: Vec<Result<Vec<Solution>, StrategyError>>,
    evaluations: Vec<EvaluatedCandidate>,
}

struct EvaluatedCandidate {
    strategy_index: usize,
    proposal_index: usize,
    solution: Solution,
    result: Result<Metrics, EvaluationError>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl EvolutionOrchestrator {
    /// Create an orchestrator running all four strategies
    pub fn new(
        generator: Arc<dyn SolutionGenerator>,
        evaluator: Arc<dyn Evaluator>,
        synthesizer: Arc<dyn Synthesizer>,
        config: EvolutionConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let strategies = MutationStrategy::all(&config.strategies);
        let (snapshot_tx, _) = watch::channel(None);
        Ok(Self {
            generator,
            evaluator,
            synthesizer,
            config,
            strategies,
            sink: None,
            snapshot_tx,
            cancel: CancellationHandle::new(),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share an externally owned cancellation signal.
    pub fn with_cancellation(mut self, cancel: CancellationHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Restrict the run to a subset of strategies. Order is preserved.
    pub fn with_strategies(mut self, strategies: Vec<MutationStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// Receive the snapshot published after every generation.
    pub fn subscribe(&self) -> watch::Receiver<Option<StateSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Mode 1: produce and score the baseline.
    #[instrument(skip_all, fields(domain = %problem.domain))]
    pub async fn generate(&self, problem: &Problem) -> Result<Solution, EngineError> {
        let baseline = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
            baseline = self.generator.generate_baseline(problem) => baseline?,
        };
        info!(solution = %baseline.id, family = %baseline.genome().family, "baseline generated");
        self.score_baseline(problem, baseline).await
    }

    /// Mode 1 then Mode 2.
    pub async fn run(&self, problem: &Problem) -> Result<EvolutionOutcome, EngineError> {
        let baseline = self.generate(problem).await?;
        self.evolve_from(problem, baseline).await
    }

    /// Mode 2: evolve `baseline` until a stop condition holds.
    ///
    /// The baseline is scored first unless it already carries valid metrics.
    pub async fn evolve_from(
        &self,
        problem: &Problem,
        baseline: Solution,
    ) -> Result<EvolutionOutcome, EngineError> {
        let baseline = self.score_baseline(problem, baseline).await?;
        let problem = Arc::new(problem.clone());

        // 1. Archive seeded with the baseline
        let mut archive = Archive::new(
            self.config.archive.clone(),
            problem.search_space.clone(),
            self.evaluator.aggregation_policy(),
        )?;
        let metrics = baseline.metrics.clone();
        let entry = archive.add(baseline, metrics)?;

        // 2. Tracker seeded with the baseline score
        let mut tracker = PerformanceTracker::new(
            self.config.tracker.clone(),
            self.config.allocation.clone(),
            self.config.convergence.clone(),
            self.config.run_limits(),
            self.cancel.clone(),
        )?;
        tracker.set_baseline(entry.id(), entry.score);
        let kinds: Vec<StrategyKind> = self.strategies.iter().map(|s| s.kind()).collect();
        tracker.set_strategies(&kinds);
        tracker.set_criteria_met(problem.criteria_met(&entry.solution.metrics));

        let current_best = CurrentBest {
            solution: entry.solution.clone(),
            score: entry.score,
        };
        let mut state = EvolutionState::new(RunId::generate(), archive, tracker, current_best);
        let seed = self.config.seed.unwrap_or_else(rand::random);
        state.phase = RunPhase::Running;
        info!(
            run = %state.run_id,
            seed,
            baseline = %entry.id(),
            baseline_score = entry.score,
            strategies = self.strategies.len(),
            "evolution started"
        );

        // 3. Generation loop
        let mut reports = Vec::new();
        let decision = loop {
            if let Some(decision) = state.tracker.stop_decision() {
                break decision;
            }
            match self.run_generation(&mut state, &problem, seed).await {
                Ok(report) => {
                    reports.push(report);
                    self.persist(&state).await;
                }
                Err(decision) => break decision,
            }
        };

        // 4. Terminate
        state.phase = RunPhase::Terminated(decision.reason);
        state.sync_best();
        self.snapshot_tx.send_replace(Some(state.snapshot()));
        info!(
            run = %state.run_id,
            reason = %decision.reason,
            detail = %decision.detail,
            generations = state.generation,
            best = %state.current_best.solution.id,
            best_score = state.current_best.score,
            "evolution finished"
        );

        let report = state.tracker.report();
        Ok(EvolutionOutcome {
            reason: decision.reason,
            detail: decision.detail,
            state,
            generation_reports: reports,
            report,
        })
    }

    /// Attach valid metrics to the baseline, evaluating it if needed.
    async fn score_baseline(
        &self,
        problem: &Problem,
        baseline: Solution,
    ) -> Result<Solution, EngineError> {
        if baseline.is_evaluated() {
            return Ok(baseline);
        }
        let timeout = self.config.concurrency.evaluation_timeout();
        let evaluated = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
            result = tokio::time::timeout(timeout, self.evaluator.evaluate(&baseline, problem)) => {
                match result {
                    Ok(metrics) => metrics.and_then(evaluators::validate),
                    Err(_) => Err(EvaluationError::Timeout(self.config.concurrency.evaluation_timeout_ms)),
                }
            }
        };
        let metrics = evaluated.map_err(EngineError::BaselineRejected)?;
        Ok(baseline.with_metrics(metrics))
    }

    /// Run one full generation. Cancellation or wall-clock expiry before
    /// commit returns the stop decision instead; nothing from an interrupted
    /// generation reaches the archive.
    #[instrument(skip_all, fields(run = %state.run_id, generation = state.generation + 1))]
    async fn run_generation(
        &self,
        state: &mut EvolutionState,
        problem: &Arc<Problem>,
        seed: u64,
    ) -> Result<GenerationReport, StopDecision> {
        let generation = state.generation + 1;

        // 1. Allocation and snapshot
        let allocation = state.tracker.recommend_allocation();
        let counts = split_candidates(self.config.budget.candidates_per_generation, &allocation);
        let snapshot = state.archive.snapshot();
        let dispatched_at = Utc::now();

        // 2-5. Dispatch and evaluate, racing cancellation and the wall clock
        let wall_clock = self.config.budget.max_wall_clock_ms;
        let remaining = wall_clock.map(|ms| Duration::from_millis(ms).saturating_sub(state.tracker.elapsed()));
        let deadline = async {
            match remaining {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => std::future::pending().await,
            }
        };
        let settled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(generation, "cancelled; discarding in-flight candidates");
                return Err(StopDecision {
                    reason: TerminationReason::Cancelled,
                    detail: format!("cancelled during generation {}", generation),
                });
            }
            _ = deadline => {
                warn!(generation, "wall-clock budget exhausted; discarding in-flight candidates");
                return Err(StopDecision {
                    reason: TerminationReason::BudgetExhausted,
                    detail: format!(
                        "wall-clock budget of {}ms exhausted during generation {}",
                        wall_clock.unwrap_or_default(),
                        generation
                    ),
                });
            }
            settled = self.dispatch_and_evaluate(snapshot, problem, &counts, generation, seed) => settled,
        };
        let settled_at = Utc::now();

        // 6-7. Commit in dispatch order
        let SettledGeneration {
            proposals,
            mut evaluations,
        } = settled;
        evaluations.sort_by_key(|e| (e.strategy_index, e.proposal_index));
        let timings = evaluations
            .iter()
            .map(|e| EvaluationTiming {
                solution_id: e.solution.id,
                strategy: self.strategies[e.strategy_index].kind(),
                started_at: e.started_at,
                finished_at: e.finished_at,
                succeeded: e.result.is_ok(),
            })
            .collect();

        let mut by_strategy: Vec<Vec<EvaluatedCandidate>> =
            self.strategies.iter().map(|_| Vec::new()).collect();
        for evaluation in evaluations {
            by_strategy[evaluation.strategy_index].push(evaluation);
        }

        let mut outcomes = Vec::with_capacity(self.strategies.len());
        for ((strategy, proposal), evaluated) in
            self.strategies.iter().zip(proposals).zip(by_strategy)
        {
            let kind = strategy.kind();
            let requested = counts.get(&kind).copied().unwrap_or(0);
            let outcome = match proposal {
                Err(e) => {
                    let reason = e.to_string();
                    let observation = state.tracker.record_failure(kind, generation, &reason);
                    StrategyOutcome {
                        strategy: kind,
                        requested,
                        proposed: 0,
                        archived: 0,
                        evaluation_failures: 0,
                        error: Some(reason),
                        observation,
                    }
                }
                Ok(candidates) => {
                    let proposed = candidates.len();
                    let mut scored = Vec::with_capacity(proposed);
                    // Aborted evaluation tasks leave no result.
                    let mut failures = proposed.saturating_sub(evaluated.len());
                    for candidate in evaluated {
                        let id = candidate.solution.id;
                        match candidate.result {
                            Ok(metrics) => match state.archive.add(candidate.solution, metrics) {
                                Ok(entry) => scored.push((entry.id(), entry.score)),
                                Err(e) => {
                                    warn!(strategy = %kind, solution = %id, error = %e, "candidate not archived");
                                    failures += 1;
                                }
                            },
                            Err(e) => {
                                warn!(strategy = %kind, solution = %id, error = %e, "candidate evaluation failed");
                                failures += 1;
                            }
                        }
                    }
                    let observation = state.tracker.record(kind, generation, &scored, failures);
                    StrategyOutcome {
                        strategy: kind,
                        requested,
                        proposed,
                        archived: scored.len(),
                        evaluation_failures: failures,
                        error: None,
                        observation,
                    }
                }
            };
            outcomes.push(outcome);
        }

        // 8. Advance
        state.sync_best();
        state.generation = generation;
        let delta = state.tracker.end_generation(generation);
        let criteria_met = problem.criteria_met(&state.current_best.solution.metrics);
        state.tracker.set_criteria_met(criteria_met);

        let report = GenerationReport {
            generation,
            dispatched_at,
            settled_at,
            allocation,
            strategies: outcomes,
            evaluations: timings,
            best_score: state.current_best.score,
            delta,
            archive_size: state.archive.len(),
        };
        info!(
            generation,
            archived = report.candidates_archived(),
            archive_size = report.archive_size,
            best_score = report.best_score,
            delta,
            "generation committed"
        );
        Ok(report)
    }

    /// Strategy stage then evaluation stage. Both stages are full barriers:
    /// every task has finished when this returns.
    async fn dispatch_and_evaluate(
        &self,
        snapshot: ArchiveSnapshot,
        problem: &Arc<Problem>,
        counts: &BTreeMap<StrategyKind, usize>,
        generation: u64,
        seed: u64,
    ) -> SettledGeneration {
        let strategy_timeout = self.config.concurrency.strategy_timeout();
        let timeout_ms = self.config.concurrency.strategy_timeout_ms;

        // Strategy stage
        let mut strategy_tasks = JoinSet::new();
        let mut task_index = HashMap::new();
        for (index, strategy) in self.strategies.iter().enumerate() {
            let kind = strategy.kind();
            let strategy = strategy.clone();
            let snapshot = snapshot.clone();
            let problem = Arc::clone(problem);
            let budget = StrategyBudget::new(counts.get(&kind).copied().unwrap_or(0), strategy_timeout);
            let ctx = StrategyContext::for_strategy(self.synthesizer.clone(), seed, generation, kind);
            let handle = strategy_tasks.spawn(async move {
                let proposal = strategy.propose(&snapshot, &problem, &budget, &ctx);
                match tokio::time::timeout(strategy_timeout, proposal).await {
                    Ok(result) => result,
                    Err(_) => Err(StrategyError::Timeout(timeout_ms)),
                }
            });
            task_index.insert(handle.id(), index);
        }

        let mut proposals: Vec<Option<Result<Vec<Solution>, StrategyError>>> =
            self.strategies.iter().map(|_| None).collect();
        while let Some(joined) = strategy_tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = task_index.get(&id) {
                        proposals[index] = Some(result);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "strategy task aborted");
                    if let Some(&index) = task_index.get(&e.id()) {
                        proposals[index] = Some(Err(StrategyError::Aborted(e.to_string())));
                    }
                }
            }
        }
        let proposals: Vec<Result<Vec<Solution>, StrategyError>> = proposals
            .into_iter()
            .map(|p| p.unwrap_or_else(|| Err(StrategyError::Aborted("task produced no result".into()))))
            .collect();

        // Evaluation stage
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.evaluation_concurrency));
        let evaluation_timeout = self.config.concurrency.evaluation_timeout();
        let evaluation_timeout_ms = self.config.concurrency.evaluation_timeout_ms;
        let mut evaluation_tasks = JoinSet::new();
        for (strategy_index, proposal) in proposals.iter().enumerate() {
            let Ok(candidates) = proposal else { continue };
            for (proposal_index, candidate) in candidates.iter().enumerate() {
                let solution = candidate.clone();
                let semaphore = Arc::clone(&semaphore);
                let evaluator = Arc::clone(&self.evaluator);
                let problem = Arc::clone(problem);
                evaluation_tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let started_at = Utc::now();
                    let result =
                        match tokio::time::timeout(evaluation_timeout, evaluator.evaluate(&solution, &problem)).await {
                            Ok(metrics) => metrics.and_then(evaluators::validate),
                            Err(_) => Err(EvaluationError::Timeout(evaluation_timeout_ms)),
                        };
                    EvaluatedCandidate {
                        strategy_index,
                        proposal_index,
                        solution,
                        result,
                        started_at,
                        finished_at: Utc::now(),
                    }
                });
            }
        }

        let mut evaluations = Vec::new();
        while let Some(joined) = evaluation_tasks.join_next().await {
            match joined {
                Ok(evaluated) => {
                    debug!(
                        solution = %evaluated.solution.id,
                        ok = evaluated.result.is_ok(),
                        "candidate evaluated"
                    );
                    evaluations.push(evaluated);
                }
                Err(e) => warn!(error = %e, "evaluation task aborted"),
            }
        }

        SettledGeneration {
            proposals,
            evaluations,
        }
    }

    /// Publish the snapshot and hand it to the sink. Sink failures only warn.
    async fn persist(&self, state: &EvolutionState) {
        let snapshot = state.snapshot();
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(&snapshot).await {
                warn!(generation = snapshot.generation, error = %e, "failed to persist state snapshot");
            }
        }
        self.snapshot_tx.send_replace(Some(snapshot));
    }
}
