//! Cache/TLB access simulation for biased binary search
//!
//! This crate provides the fitness function of the bias constant optimizer:
//! - Hardware geometry descriptions (sets, block size, sweep start)
//! - The biased midpoint formula, bit-exact with the tuned search
//! - A breadth-first replay of every probe a biased search can make
//! - Escalating set-conflict tracking that turns probes into a utility
//! - Worst-case size sweeps, aggregation across geometries and memoization
//!
//! # Modules
//!
//! - [`hardware`]: Hardware specs and their builder
//! - [`tracker`]: Per-run access tracking and scoring
//! - [`simulate`]: Biased search replay over a bounded work list
//! - [`evaluator`]: Size sweeps, aggregation and simulation settings
//! - [`cache`]: Dense and sparse utility memoization

pub mod cache;
pub mod candidate;
pub mod constant;
pub mod error;
pub mod evaluator;
pub mod hardware;
pub mod midpoint;
pub mod simulate;
pub mod tracker;

pub use cache::{CacheMode, CacheStats, DenseUtilityCache, SparseUtilityCache, UtilityCache};
pub use candidate::Candidate;
pub use constant::{BIAS_BITS, BIAS_DOMAIN, BIAS_MASK, BiasConstant};
pub use error::{BiasError, BiasResult};
pub use evaluator::{Evaluator, SimulationConfig, SpecUtility};
pub use hardware::{HardwareSpec, HardwareSpecBuilder, HardwareSpecConfig};
pub use midpoint::{biased_midpoint, standard_midpoint};
pub use simulate::{DEFAULT_QUEUE_CAPACITY, IntervalQueue, SimulationOutcome, simulate_search};
pub use tracker::{AccessObserver, TrackerScores, UtilityTracker};
