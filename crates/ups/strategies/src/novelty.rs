use crate::budget::StrategyBudget;
use crate::config::NoveltyConfig;
use crate::context::StrategyContext;
use crate::error::StrategyError;
use crate::operators::random_genome;
use crate::strategy::materialize;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use tokio::time::Instant;
use ups_archive::{ArchiveEntry, ArchiveSnapshot};
use ups_types::{Genome, Problem, Solution, StrategyKind};

/// Explores regions of the search space far from every existing cluster.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoveltySearch {
    pub config: NoveltyConfig,
}

impl NoveltySearch {
    pub fn new(config: NoveltyConfig) -> Self {
        Self { config }
    }

    pub async fn propose(
        &self,
        snapshot: &ArchiveSnapshot,
        problem: &Problem,
        budget: &StrategyBudget,
        ctx: &StrategyContext,
    ) -> Result<Vec<Solution>, StrategyError> {
        let kind = StrategyKind::NoveltySearch;
        let space = snapshot.search_space();
        if space.is_empty() {
            return Err(StrategyError::EmptySearchSpace);
        }

        // Families not yet represented are explored first.
        let present = snapshot.families();
        let absent: Vec<&String> = space
            .families
            .keys()
            .filter(|f| !present.contains(f.as_str()))
            .collect();
        let pool: Vec<&String> = if absent.is_empty() {
            space.families.keys().collect()
        } else {
            absent
        };

        let seed_parent = least_crowded(snapshot);
        let deadline = Instant::now() + budget.time_limit;
        let mut rng = ctx.rng();
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(budget.max_candidates);

        for _ in 0..budget.max_candidates.saturating_mul(4) {
            if out.len() >= budget.max_candidates || Instant::now() >= deadline {
                break;
            }

            let mut winner: Option<(Genome, f64)> = None;
            for _ in 0..self.config.trials_per_candidate {
                let Some(family) = pool.choose(&mut rng) else {
                    break;
                };
                let Some(trial) = random_genome(space, family, &mut rng) else {
                    continue;
                };
                let score = snapshot.novelty_of(&trial);
                if winner.as_ref().map_or(true, |(_, best)| score > *best) {
                    winner = Some((trial, score));
                }
            }
            let Some((genome, novelty)) = winner else {
                continue;
            };
            if snapshot.contains_genome(&genome) || !seen.insert(genome.canonical_key()) {
                continue;
            }
            tracing::debug!(strategy = %kind, family = %genome.family, novelty, "novel genome selected");

            let parents: Vec<&Solution> = seed_parent.iter().map(|e| &e.solution).collect();
            let solution = materialize(kind, genome, &parents, problem, ctx, &mut rng).await?;
            out.push(solution.with_note("novelty", format!("{:.4}", novelty)));
        }

        tracing::debug!(strategy = %kind, proposed = out.len(), "novelty search finished");
        Ok(out)
    }
}

/// Best-scoring member of the least populated cluster (ties: lowest cluster
/// id, then highest score).
fn least_crowded(snapshot: &ArchiveSnapshot) -> Option<&ArchiveEntry> {
    let cluster = snapshot
        .clusters()
        .iter()
        .min_by(|a, b| a.population.cmp(&b.population).then(a.id.cmp(&b.id)))?
        .id;
    snapshot
        .entries()
        .iter()
        .filter(|e| e.cluster == cluster)
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
}
