#![deny(unsafe_code)]
//! # ups-tracker
//!
//! Performance tracker and convergence monitor for the evolution engine.
//!
//! Keeps an exponentially weighted effectiveness score per strategy, turns the
//! scores into bounded resource shares, watches a sliding window of best-score
//! deltas for a plateau, and decides when a run stops.

pub mod allocation;
pub mod config;
pub mod error;
pub mod history;
pub mod report;
pub mod tracker;

pub use allocation::{clamp_shares, softmax_shares};
pub use config::{AllocationConfig, ConvergenceConfig, RunLimits, TrackerConfig};
pub use error::TrackerError;
pub use history::{AttemptHistory, AttemptOutcome, AttemptRecord, Breakthrough};
pub use report::{EvolutionReport, StrategyStanding};
pub use tracker::{PerformanceTracker, StopDecision, StrategyStats, TerminationReason};
