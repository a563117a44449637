#![deny(unsafe_code)]
//! # ups-strategies
//!
//! The four mutation strategies of the evolution engine. Each reads an
//! immutable archive snapshot, picks parents, decides new genomes and asks a
//! [`Synthesizer`](ups_types::Synthesizer) to render them as code:
//!
//! - **Local optimisation**: small parameter steps around strong solutions
//! - **Structural change**: swap the algorithm family or a component
//! - **Crossover**: recombine structurally different parents
//! - **Novelty search**: random exploration far from existing clusters

pub mod budget;
pub mod config;
pub mod context;
pub mod crossover;
pub mod error;
pub mod local;
pub mod novelty;
pub mod operators;
pub mod strategy;
pub mod structural;
pub mod synthesizer;

pub use budget::{split_candidates, StrategyBudget};
pub use config::{CrossoverConfig, LocalConfig, NoveltyConfig, StrategiesConfig, StructuralConfig};
pub use context::{derive_seed, StrategyContext};
pub use crossover::Crossover;
pub use error::StrategyError;
pub use local::LocalOptimization;
pub use novelty::NoveltySearch;
pub use strategy::MutationStrategy;
pub use structural::StructuralChange;
pub use synthesizer::{FailingSynthesizer, TemplateSynthesizer};
