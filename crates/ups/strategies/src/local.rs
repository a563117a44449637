use crate::budget::StrategyBudget;
use crate::config::LocalConfig;
use crate::context::StrategyContext;
use crate::error::StrategyError;
use crate::operators::{is_tunable, mutate_parameters};
use crate::strategy::materialize;
use rand::Rng;
use std::collections::BTreeSet;
use tokio::time::Instant;
use ups_archive::ArchiveSnapshot;
use ups_types::{Problem, Solution, StrategyKind};

/// Small parameter perturbations around strong solutions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalOptimization {
    pub config: LocalConfig,
}

impl LocalOptimization {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    pub async fn propose(
        &self,
        snapshot: &ArchiveSnapshot,
        problem: &Problem,
        budget: &StrategyBudget,
        ctx: &StrategyContext,
    ) -> Result<Vec<Solution>, StrategyError> {
        let kind = StrategyKind::LocalOptimization;
        let space = snapshot.search_space();
        let tunable = |family: &str| {
            space
                .family(family)
                .map_or(false, |f| f.parameters.values().any(is_tunable))
        };
        if !snapshot
            .entries()
            .iter()
            .any(|e| tunable(&e.solution.genome().family))
        {
            let family = snapshot
                .best()
                .map(|e| e.solution.genome().family.clone())
                .unwrap_or_default();
            return Err(StrategyError::NoTunableParameters(family));
        }

        let deadline = Instant::now() + budget.time_limit;
        let mut rng = ctx.rng();
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(budget.max_candidates);
        let max_attempts = budget.max_candidates.saturating_mul(4);

        for _ in 0..max_attempts {
            if out.len() >= budget.max_candidates || Instant::now() >= deadline {
                break;
            }
            let use_best = rng.gen_bool(self.config.prefer_best);
            let parent = match snapshot.best() {
                Some(best) if use_best => best,
                _ => match snapshot.select_parents(kind, 1, &mut rng)?.first() {
                    Some(p) => *p,
                    None => break,
                },
            };
            let genome = parent.solution.genome();
            let Some(family) = space.family(&genome.family) else {
                continue;
            };
            let Some(child) = mutate_parameters(
                genome,
                family,
                self.config.mutation_rate,
                self.config.step_fraction,
                &mut rng,
            ) else {
                continue;
            };
            if !seen.insert(child.canonical_key()) {
                continue;
            }
            let solution = materialize(kind, child, &[&parent.solution], problem, ctx, &mut rng).await?;
            out.push(solution);
        }

        tracing::debug!(strategy = %kind, proposed = out.len(), "local optimisation finished");
        Ok(out)
    }
}
