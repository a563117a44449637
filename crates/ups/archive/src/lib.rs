#![deny(unsafe_code)]
//! # ups-archive
//!
//! Bounded population store for the evolution engine. Every archived solution
//! is scored, placed in a performance tier, and assigned to a structural
//! diversity cluster. When the archive is full the weakest member of the most
//! crowded cluster is pruned; the best solution is never pruned.
//!
//! Parent selection samples without replacement, weighted either by tier
//! (exploitation) or by inverse cluster population (diversity).

pub mod archive;
pub mod config;
pub mod error;
pub mod selection;
pub mod signature;
pub mod snapshot;
pub mod tiers;
pub mod types;

pub use archive::Archive;
pub use config::{ArchiveConfig, TierPercentiles};
pub use error::ArchiveError;
pub use selection::SelectionPolicy;
pub use signature::{distance, novelty, DistanceWeights, StructuralSignature};
pub use snapshot::ArchiveSnapshot;
pub use tiers::TierCutPoints;
pub use types::{ArchiveEntry, ArchiveSummary, Cluster, ClusterId};
