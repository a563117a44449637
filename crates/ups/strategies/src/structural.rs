use crate::budget::StrategyBudget;
use crate::config::StructuralConfig;
use crate::context::StrategyContext;
use crate::error::StrategyError;
use crate::operators::switch_family;
use crate::strategy::materialize;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tokio::time::Instant;
use ups_archive::ArchiveSnapshot;
use ups_types::{Genome, Problem, SearchSpace, Solution, StrategyKind};

/// Swaps the algorithm family or one structural component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuralChange {
    pub config: StructuralConfig,
}

impl StructuralChange {
    pub fn new(config: StructuralConfig) -> Self {
        Self { config }
    }

    pub async fn propose(
        &self,
        snapshot: &ArchiveSnapshot,
        problem: &Problem,
        budget: &StrategyBudget,
        ctx: &StrategyContext,
    ) -> Result<Vec<Solution>, StrategyError> {
        let kind = StrategyKind::StructuralChange;
        let space = snapshot.search_space();
        let can_swap_family = space.families.len() > 1;
        let swappable_slots: Vec<&String> = space
            .components
            .iter()
            .filter(|(_, options)| options.len() > 1)
            .map(|(slot, _)| slot)
            .collect();
        if !can_swap_family && swappable_slots.is_empty() {
            let family = snapshot
                .best()
                .map(|e| e.solution.genome().family.clone())
                .unwrap_or_default();
            return Err(StrategyError::NoStructuralAlternative(family));
        }

        let deadline = Instant::now() + budget.time_limit;
        let mut rng = ctx.rng();
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(budget.max_candidates);

        for _ in 0..budget.max_candidates.saturating_mul(4) {
            if out.len() >= budget.max_candidates || Instant::now() >= deadline {
                break;
            }
            let Some(parent) = snapshot.select_parents(kind, 1, &mut rng)?.first().copied() else {
                break;
            };
            let genome = parent.solution.genome();

            let swap_family = can_swap_family
                && (swappable_slots.is_empty() || rng.gen_bool(self.config.family_swap_probability));
            let child = if swap_family {
                swap_family_of(genome, space, &mut rng)
            } else {
                swap_component_of(genome, space, &swappable_slots, &mut rng)
            };
            let Some(child) = child else {
                continue;
            };
            if child == *genome || !seen.insert(child.canonical_key()) {
                continue;
            }
            let solution = materialize(kind, child, &[&parent.solution], problem, ctx, &mut rng).await?;
            out.push(solution);
        }

        tracing::debug!(strategy = %kind, proposed = out.len(), "structural change finished");
        Ok(out)
    }
}

fn swap_family_of<R: Rng + ?Sized>(genome: &Genome, space: &SearchSpace, rng: &mut R) -> Option<Genome> {
    let others: Vec<(&String, _)> = space
        .families
        .iter()
        .filter(|(name, _)| **name != genome.family)
        .collect();
    let (name, spec) = others.choose(rng)?;
    Some(switch_family(genome, name, spec))
}

fn swap_component_of<R: Rng + ?Sized>(
    genome: &Genome,
    space: &SearchSpace,
    slots: &[&String],
    rng: &mut R,
) -> Option<Genome> {
    let slot = *slots.choose(rng)?;
    let current = genome.components.get(slot);
    let options: Vec<&String> = space
        .components
        .get(slot)?
        .iter()
        .filter(|o| Some(*o) != current)
        .collect();
    let choice = options.choose(rng)?;
    let mut child = genome.clone();
    child.components.insert(slot.clone(), (*choice).clone());
    Some(child)
}
