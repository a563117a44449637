use crate::budget::StrategyBudget;
use crate::config::CrossoverConfig;
use crate::context::StrategyContext;
use crate::error::StrategyError;
use crate::strategy::materialize;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tokio::time::Instant;
use ups_archive::{ArchiveEntry, ArchiveSnapshot};
use ups_types::{Genome, Problem, Solution, StrategyKind};

/// Recombines structurally different parents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Crossover {
    pub config: CrossoverConfig,
}

impl Crossover {
    pub fn new(config: CrossoverConfig) -> Self {
        Self { config }
    }

    /// Parents whose genomes are all identical cannot be recombined; such
    /// draws yield nothing, and a batch made only of them is an empty, not a
    /// failed, proposal.
    pub async fn propose(
        &self,
        snapshot: &ArchiveSnapshot,
        problem: &Problem,
        budget: &StrategyBudget,
        ctx: &StrategyContext,
    ) -> Result<Vec<Solution>, StrategyError> {
        let kind = StrategyKind::Crossover;
        let deadline = Instant::now() + budget.time_limit;
        let mut rng = ctx.rng();
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(budget.max_candidates);
        let mut incompatible = 0usize;

        for _ in 0..budget.max_candidates.saturating_mul(4) {
            if out.len() >= budget.max_candidates || Instant::now() >= deadline {
                break;
            }
            let parents = snapshot.select_parents(kind, self.config.parents_per_child, &mut rng)?;
            if !compatible(&parents) {
                incompatible += 1;
                continue;
            }
            let child = recombine(&parents, &mut rng);
            if parents.iter().any(|p| *p.solution.genome() == child)
                || !seen.insert(child.canonical_key())
            {
                continue;
            }
            let parent_solutions: Vec<&Solution> = parents.iter().map(|p| &p.solution).collect();
            let solution = materialize(kind, child, &parent_solutions, problem, ctx, &mut rng).await?;
            out.push(solution);
        }

        if out.is_empty() && incompatible > 0 {
            tracing::warn!(
                strategy = %kind,
                draws = incompatible,
                "no structurally distinct parents available, crossover produced nothing"
            );
        }
        tracing::debug!(strategy = %kind, proposed = out.len(), "crossover finished");
        Ok(out)
    }
}

/// At least two parents, and not every genome the same.
fn compatible(parents: &[&ArchiveEntry]) -> bool {
    match parents.split_first() {
        Some((first, rest)) if !rest.is_empty() => rest
            .iter()
            .any(|p| p.solution.genome() != first.solution.genome()),
        _ => false,
    }
}

/// Family from one parent, each component slot from a random parent that has
/// it, each parameter from a random family-matching parent.
pub(crate) fn recombine<R: Rng + ?Sized>(parents: &[&ArchiveEntry], rng: &mut R) -> Genome {
    let genomes: Vec<&Genome> = parents.iter().map(|p| p.solution.genome()).collect();
    let family = genomes[rng.gen_range(0..genomes.len())].family.clone();
    let mut child = Genome::new(family.clone());

    let slots: BTreeSet<&String> = genomes.iter().flat_map(|g| g.components.keys()).collect();
    for slot in slots {
        let donors: Vec<_> = genomes.iter().filter(|g| g.components.contains_key(slot)).collect();
        if let Some(donor) = donors.choose(rng) {
            if let Some(choice) = donor.components.get(slot) {
                child.components.insert(slot.clone(), choice.clone());
            }
        }
    }

    let same_family: Vec<&Genome> = genomes.iter().copied().filter(|g| g.family == family).collect();
    let params: BTreeSet<&String> = same_family.iter().flat_map(|g| g.parameters.keys()).collect();
    for name in params {
        let donors: Vec<_> = same_family
            .iter()
            .filter(|g| g.parameters.contains_key(name))
            .collect();
        if let Some(donor) = donors.choose(rng) {
            if let Some(value) = donor.parameters.get(name) {
                child.parameters.insert(name.clone(), value.clone());
            }
        }
    }
    child
}
