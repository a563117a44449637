use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use ups_types::{StrategyKind, Synthesizer};

/// Everything a strategy needs besides the archive snapshot and the problem.
#[derive(Clone)]
pub struct StrategyContext {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub generation: u64,
    pub seed: u64,
}

impl StrategyContext {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, generation: u64, seed: u64) -> Self {
        Self {
            synthesizer,
            generation,
            seed,
        }
    }

    /// Context for one strategy in one generation of a seeded run.
    pub fn for_strategy(
        synthesizer: Arc<dyn Synthesizer>,
        run_seed: u64,
        generation: u64,
        kind: StrategyKind,
    ) -> Self {
        Self::new(synthesizer, generation, derive_seed(run_seed, generation, kind))
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

impl fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyContext")
            .field("generation", &self.generation)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Mix run seed, generation and strategy into an independent stream seed.
pub fn derive_seed(run_seed: u64, generation: u64, kind: StrategyKind) -> u64 {
    let mut x = run_seed
        ^ generation.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ ((kind.index() as u64 + 1) << 56);
    // splitmix64 finaliser
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
