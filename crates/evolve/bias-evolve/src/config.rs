//! Optimizer configuration
//!
//! Everything tunable about a run lives in one [`EvolutionConfig`], loadable
//! from TOML. Omitted keys take their defaults, so an empty file describes the
//! stock run over the built-in hardware catalog.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bias_core::{
    CacheMode, Evaluator, HardwareSpec, HardwareSpecConfig, SimulationConfig, UtilityCache,
};
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, EvolveResult};
use crate::population::GroomSettings;

/// Settings for one optimizer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Seed of the shared random generator
    pub seed: u64,
    /// Population size kept after grooming
    pub population_limit: usize,
    /// Random candidates evaluated before breeding starts
    pub initial_population: usize,
    /// Breeding threads
    pub workers: usize,
    /// Pause between grooming passes
    pub groom_period_ms: u64,
    /// Pause between progress checks
    pub monitor_period_ms: u64,
    /// Random newcomers injected by each grooming pass
    pub fresh_per_groom: usize,
    /// Top candidates hill-climbed by each grooming pass
    pub hill_climb_top: usize,
    /// Selection bias of the first parent
    pub primary_eliteness: f64,
    /// Selection bias of the second parent
    pub secondary_eliteness: f64,
    /// Chance that a child is mutated after crossover
    pub mutation_probability: f64,
    pub cache: CacheMode,
    pub simulation: SimulationConfig,
    pub hardware: Vec<HardwareSpecConfig>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            seed: 5,
            population_limit: 1000,
            initial_population: 100,
            workers: 5,
            groom_period_ms: 1000,
            monitor_period_ms: 10,
            fresh_per_groom: 10,
            hill_climb_top: 20,
            primary_eliteness: 10.0,
            secondary_eliteness: 5.0,
            mutation_probability: 0.1,
            cache: CacheMode::Dense,
            simulation: SimulationConfig::default(),
            hardware: HardwareSpec::default_catalog()
                .iter()
                .map(HardwareSpecConfig::from)
                .collect(),
        }
    }
}

impl EvolutionConfig {
    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> EvolveResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded optimizer config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> EvolveResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> EvolveResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> EvolveResult<()> {
        let invalid = |reason: &str| {
            Err(EvolveError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.population_limit == 0 {
            return invalid("population_limit must be at least 1");
        }
        if self.initial_population == 0 {
            return invalid("initial_population must be at least 1");
        }
        if self.workers == 0 {
            return invalid("workers must be at least 1");
        }
        if self.groom_period_ms == 0 || self.monitor_period_ms == 0 {
            return invalid("groom and monitor periods must be positive");
        }
        for eliteness in [self.primary_eliteness, self.secondary_eliteness] {
            if !eliteness.is_finite() || eliteness <= 0.0 {
                return invalid("eliteness must be a positive number");
            }
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return invalid("mutation_probability must lie in [0, 1]");
        }
        if self.hardware.is_empty() {
            return invalid("at least one [[hardware]] entry is required");
        }

        if self.hill_climb_top > self.population_limit {
            log::warn!(
                "hill_climb_top {} exceeds population_limit {}; only {} can be climbed",
                self.hill_climb_top,
                self.population_limit,
                self.population_limit
            );
        }

        self.simulation.validate()?;
        self.hardware_specs()?;
        Ok(())
    }

    /// Build every configured hardware spec, failing on the first invalid one
    pub fn hardware_specs(&self) -> EvolveResult<Vec<HardwareSpec>> {
        Ok(self
            .hardware
            .iter()
            .map(HardwareSpecConfig::build)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub fn groom_settings(&self) -> GroomSettings {
        GroomSettings {
            fresh: self.fresh_per_groom,
            hill_climb_top: self.hill_climb_top,
        }
    }

    pub fn groom_period(&self) -> Duration {
        Duration::from_millis(self.groom_period_ms)
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(self.monitor_period_ms)
    }

    /// Evaluator over the configured hardware, backed by the configured cache
    pub fn build_evaluator(&self) -> EvolveResult<Evaluator> {
        self.build_evaluator_with(self.cache.build())
    }

    pub fn build_evaluator_with(&self, cache: Arc<dyn UtilityCache>) -> EvolveResult<Evaluator> {
        Ok(Evaluator::new(
            self.hardware_specs()?,
            self.simulation.clone(),
            cache,
        )?)
    }
}
