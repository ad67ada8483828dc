//! Evolutionary search for the biased binary-search constant
//!
//! Candidates are 28-bit constants scored by [`bias_core::Evaluator`]. A run
//! keeps a ranked, deduplicated population that several breeding threads
//! extend concurrently (rank-biased parent selection, bit-mask crossover,
//! occasional mutation) while a grooming thread keeps it bounded, injects
//! random newcomers and hill-climbs the leaders.
//!
//! # Modules
//!
//! - [`config`]: TOML-loadable run settings
//! - [`crossover`] and [`mutation`]: genetic operators
//! - [`population`]: shared ranked pool with grooming
//! - [`scheduler`]: thread lifecycle and stop handling
//! - [`report`]: progress reporting of new leaders
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use bias_evolve::{EvolutionConfig, Optimizer};
//!
//! let optimizer = Optimizer::new(EvolutionConfig::default())?;
//! let handle = optimizer.start()?;
//! handle.run_for(Duration::from_secs(60));
//! if let Some(best) = handle.stop() {
//!     println!("{best}");
//! }
//! # Ok::<(), bias_evolve::EvolveError>(())
//! ```

pub mod config;
pub mod crossover;
pub mod error;
pub mod mutation;
pub mod population;
pub mod report;
pub mod rng;
pub mod scheduler;

pub use config::EvolutionConfig;
pub use crossover::Crossover;
pub use error::{EvolveError, EvolveResult};
pub use mutation::Mutation;
pub use population::{GroomReport, GroomSettings, Population};
pub use report::{BestReport, LogReporter, ProgressReporter};
pub use rng::EvolutionRng;
pub use scheduler::{Optimizer, OptimizerHandle, OptimizerState, StopSignal};
