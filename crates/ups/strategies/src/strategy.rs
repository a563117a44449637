use crate::budget::StrategyBudget;
use crate::config::StrategiesConfig;
use crate::context::StrategyContext;
use crate::crossover::Crossover;
use crate::error::StrategyError;
use crate::local::LocalOptimization;
use crate::novelty::NoveltySearch;
use crate::structural::StructuralChange;
use rand::Rng;
use ups_archive::ArchiveSnapshot;
use ups_types::{Genome, Problem, Solution, SolutionId, StrategyKind, SynthesisRequest};

/// The closed set of mutation strategies.
///
/// Each variant reads an immutable archive snapshot and returns new,
/// unevaluated solutions whose lineage names the parents they came from.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationStrategy {
    Local(LocalOptimization),
    Structural(StructuralChange),
    Crossover(Crossover),
    Novelty(NoveltySearch),
}

impl MutationStrategy {
    pub fn from_config(kind: StrategyKind, config: &StrategiesConfig) -> Self {
        match kind {
            StrategyKind::LocalOptimization => {
                MutationStrategy::Local(LocalOptimization::new(config.local.clone()))
            }
            StrategyKind::StructuralChange => {
                MutationStrategy::Structural(StructuralChange::new(config.structural.clone()))
            }
            StrategyKind::Crossover => {
                MutationStrategy::Crossover(Crossover::new(config.crossover.clone()))
            }
            StrategyKind::NoveltySearch => {
                MutationStrategy::Novelty(NoveltySearch::new(config.novelty.clone()))
            }
        }
    }

    /// All four strategies in dispatch order.
    pub fn all(config: &StrategiesConfig) -> Vec<MutationStrategy> {
        StrategyKind::ALL
            .iter()
            .map(|k| MutationStrategy::from_config(*k, config))
            .collect()
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MutationStrategy::Local(_) => StrategyKind::LocalOptimization,
            MutationStrategy::Structural(_) => StrategyKind::StructuralChange,
            MutationStrategy::Crossover(_) => StrategyKind::Crossover,
            MutationStrategy::Novelty(_) => StrategyKind::NoveltySearch,
        }
    }

    /// Propose up to `budget.max_candidates` new solutions.
    pub async fn propose(
        &self,
        snapshot: &ArchiveSnapshot,
        problem: &Problem,
        budget: &StrategyBudget,
        ctx: &StrategyContext,
    ) -> Result<Vec<Solution>, StrategyError> {
        if budget.max_candidates == 0 {
            return Ok(Vec::new());
        }
        match self {
            MutationStrategy::Local(s) => s.propose(snapshot, problem, budget, ctx).await,
            MutationStrategy::Structural(s) => s.propose(snapshot, problem, budget, ctx).await,
            MutationStrategy::Crossover(s) => s.propose(snapshot, problem, budget, ctx).await,
            MutationStrategy::Novelty(s) => s.propose(snapshot, problem, budget, ctx).await,
        }
    }
}

/// Render `genome` through the synthesizer and wrap it as a child of `parents`.
pub(crate) async fn materialize<R: Rng + ?Sized>(
    kind: StrategyKind,
    genome: Genome,
    parents: &[&Solution],
    problem: &Problem,
    ctx: &StrategyContext,
    rng: &mut R,
) -> Result<Solution, StrategyError> {
    let code = {
        let request = SynthesisRequest {
            kind,
            genome: &genome,
            parents: parents.to_vec(),
            problem,
            generation: ctx.generation,
        };
        ctx.synthesizer.synthesize(&request).await?
    };
    let id = SolutionId::from_rng(rng);
    Ok(Solution::derive(id, parents, genome, code, kind, ctx.generation))
}
