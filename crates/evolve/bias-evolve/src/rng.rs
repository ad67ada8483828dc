//! Process-wide deterministic random source
//!
//! Every random decision of a run (initial population, parent selection,
//! operator choice, mutation bit positions, fresh candidates) draws from one
//! generator seeded once at startup, so a seed names a trajectory. With several
//! breeding threads the interleaving of draws still depends on scheduling.

use bias_core::{BIAS_MASK, BiasConstant};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared, seeded random number generator
#[derive(Debug)]
pub struct EvolutionRng {
    inner: Mutex<StdRng>,
}

impl EvolutionRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Run `f` with exclusive access to the generator
    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Uniform draw from `[0, 1)`
    pub fn unit(&self) -> f64 {
        self.with(|rng| rng.gen_range(0.0..1.0))
    }

    /// Uniform index below `n` (`n` must be non-zero)
    pub fn below(&self, n: usize) -> usize {
        self.with(|rng| rng.gen_range(0..n))
    }

    /// Uniformly random 28-bit constant
    pub fn constant(&self) -> BiasConstant {
        BiasConstant::new(self.with(|rng| rng.gen_range(0..=BIAS_MASK)))
    }
}
