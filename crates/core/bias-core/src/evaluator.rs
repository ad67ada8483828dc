//! Fitness evaluation of bias constants
//!
//! For every hardware spec the evaluator sweeps a range of array sizes, runs a
//! fresh [`UtilityTracker`] through the simulated search for each one and keeps
//! the worst result. The per-spec worst utilities are compressed with a strong
//! root and averaged, so raising a weak spec counts for more than polishing a
//! strong one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, UtilityCache};
use crate::constant::BiasConstant;
use crate::error::{BiasError, BiasResult};
use crate::hardware::HardwareSpec;
use crate::simulate::{DEFAULT_QUEUE_CAPACITY, IntervalQueue, simulate_search};
use crate::tracker::{TrackerScores, UtilityTracker};

/// Parameters of the size sweep and of the utility formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Size of one array element (32-bit `int`/`float` arrays by default)
    pub element_size_in_bytes: u32,
    /// Largest power-of-two magnitude in the array size sweep
    pub max_magnitude: u32,
    /// Smallest significand; sizes are `significand << magnitude`
    pub min_significand: u32,
    /// Largest significand
    pub max_significand: u32,
    /// Pending intervals one simulation may hold before stopping early
    pub queue_capacity: usize,
    /// Exponent applied to each spec's worst utility before averaging
    pub aggregation_exponent: f64,
    /// Utility of a run that never finished
    pub incomplete_utility: f32,
    /// Score used in place of `log2(count)` for a failure that never happened
    pub unobserved_failure_score: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            element_size_in_bytes: 4,
            max_magnitude: 27,
            min_significand: 8,
            max_significand: 15,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            aggregation_exponent: 1.0 / 100.0,
            incomplete_utility: 14.0,
            unobserved_failure_score: 15.0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> BiasResult<()> {
        let invalid = |reason: String| Err(BiasError::InvalidSimulation { reason });

        if !self.element_size_in_bytes.is_power_of_two() {
            return invalid(format!(
                "element_size_in_bytes must be a power of two, got {}",
                self.element_size_in_bytes
            ));
        }
        if self.min_significand == 0 || self.min_significand > self.max_significand {
            return invalid(format!(
                "significand range {}..={} is empty",
                self.min_significand, self.max_significand
            ));
        }
        // every simulated size must be a positive i32
        let largest = u64::from(self.max_significand).checked_shl(self.max_magnitude);
        if largest.is_none_or(|size| size > i32::MAX as u64) {
            return invalid(format!(
                "{} << {} does not fit a 32-bit array size",
                self.max_significand, self.max_magnitude
            ));
        }
        if self.queue_capacity < 2 {
            return invalid(format!("queue_capacity must be at least 2, got {}", self.queue_capacity));
        }
        if !(self.aggregation_exponent.is_finite() && self.aggregation_exponent > 0.0) {
            return invalid(format!(
                "aggregation_exponent must be positive, got {}",
                self.aggregation_exponent
            ));
        }
        Ok(())
    }

    pub fn scores(&self) -> TrackerScores {
        TrackerScores {
            incomplete: self.incomplete_utility,
            unobserved: self.unobserved_failure_score,
        }
    }

    /// First magnitude of the sweep, chosen so the smallest size is the spec's
    /// minimum array size
    pub fn min_magnitude(&self, spec: &HardwareSpec) -> u32 {
        let min_elements = spec.min_array_size_in_bytes() / self.element_size_in_bytes;
        if min_elements == 0 {
            return 0;
        }
        min_elements
            .ilog2()
            .saturating_sub(self.min_significand.ilog2())
    }

    /// Array sizes (in elements) swept for `spec`, smallest first
    pub fn array_sizes(&self, spec: &HardwareSpec) -> impl Iterator<Item = i32> {
        let significands = self.min_significand..=self.max_significand;
        (self.min_magnitude(spec)..=self.max_magnitude).flat_map(move |magnitude| {
            significands
                .clone()
                .map(move |significand| (significand << magnitude) as i32)
        })
    }
}

/// Worst-case utility of one constant on one hardware spec
#[derive(Debug, Clone, PartialEq)]
pub struct SpecUtility {
    pub spec: HardwareSpec,
    pub utility: f32,
}

#[derive(Debug, Clone)]
struct PreparedSpec {
    spec: HardwareSpec,
    line_shift: u32,
}

/// Computes and memoizes the fitness of bias constants
pub struct Evaluator {
    specs: Vec<PreparedSpec>,
    config: SimulationConfig,
    cache: Arc<dyn UtilityCache>,
}

impl Evaluator {
    /// Build an evaluator over `specs`.
    ///
    /// Fails if there are no specs, the simulation config is invalid, a block
    /// is smaller than one element, or a spec's minimum array size lies beyond
    /// the sweep.
    pub fn new(
        specs: Vec<HardwareSpec>,
        config: SimulationConfig,
        cache: Arc<dyn UtilityCache>,
    ) -> BiasResult<Self> {
        if specs.is_empty() {
            return Err(BiasError::NoHardwareSpecs);
        }
        config.validate()?;

        let specs = specs
            .into_iter()
            .map(|spec| {
                let line_shift = spec.line_shift(config.element_size_in_bytes)?;
                if config.min_magnitude(&spec) > config.max_magnitude {
                    return Err(BiasError::InvalidSimulation {
                        reason: format!(
                            "'{}' starts its sweep above max_magnitude {}",
                            spec.description(),
                            config.max_magnitude
                        ),
                    });
                }
                Ok(PreparedSpec { spec, line_shift })
            })
            .collect::<BiasResult<Vec<_>>>()?;

        log::debug!(
            "evaluator ready: {} hardware specs, magnitudes up to {}",
            specs.len(),
            config.max_magnitude
        );
        Ok(Self {
            specs,
            config,
            cache,
        })
    }

    pub fn specs(&self) -> impl ExactSizeIterator<Item = &HardwareSpec> {
        self.specs.iter().map(|prepared| &prepared.spec)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Tracker of the array size on which `constant` does worst for `spec`
    pub fn worst(&self, constant: BiasConstant, spec: &HardwareSpec) -> BiasResult<UtilityTracker> {
        let prepared = PreparedSpec {
            spec: spec.clone(),
            line_shift: spec.line_shift(self.config.element_size_in_bytes)?,
        };
        let mut queue = IntervalQueue::with_capacity(self.config.queue_capacity);
        self.worst_prepared(constant, &prepared, &mut queue)
            .ok_or_else(|| BiasError::InvalidSimulation {
                reason: format!("'{}' has an empty size sweep", spec.description()),
            })
    }

    fn worst_prepared(
        &self,
        constant: BiasConstant,
        prepared: &PreparedSpec,
        queue: &mut IntervalQueue,
    ) -> Option<UtilityTracker> {
        let scores = self.config.scores();
        let mut worst: Option<UtilityTracker> = None;
        for size in self.config.array_sizes(&prepared.spec) {
            let mut tracker = UtilityTracker::for_spec(&prepared.spec, prepared.line_shift, scores);
            simulate_search(constant, 0, size, &mut tracker, queue);
            if worst.as_ref().is_none_or(|w| tracker.utility() < w.utility()) {
                worst = Some(tracker);
            }
        }
        worst
    }

    fn worst_utility(
        &self,
        constant: BiasConstant,
        prepared: &PreparedSpec,
        queue: &mut IntervalQueue,
    ) -> f32 {
        self.worst_prepared(constant, prepared, queue)
            .map_or(self.config.incomplete_utility, |tracker| tracker.utility())
    }

    /// Fitness of `constant`, always simulated from scratch
    pub fn compute_utility(&self, constant: BiasConstant) -> f32 {
        let mut queue = IntervalQueue::with_capacity(self.config.queue_capacity);
        let total: f64 = self
            .specs
            .iter()
            .map(|prepared| {
                let u = self.worst_utility(constant, prepared, &mut queue);
                f64::from(u).powf(self.config.aggregation_exponent)
            })
            .sum();
        (total / self.specs.len() as f64) as f32
    }

    /// Fitness of `constant`, simulated at most once per distinct value
    /// (modulo concurrent first requests)
    pub fn utility(&self, constant: BiasConstant) -> f32 {
        if let Some(utility) = self.cache.get(constant) {
            return utility;
        }
        let utility = self.compute_utility(constant);
        self.cache.insert(constant, utility);
        utility
    }

    /// Worst utility of `constant` on each spec, in spec order
    pub fn spec_utilities(&self, constant: BiasConstant) -> Vec<SpecUtility> {
        let mut queue = IntervalQueue::with_capacity(self.config.queue_capacity);
        self.specs
            .iter()
            .map(|prepared| SpecUtility {
                spec: prepared.spec.clone(),
                utility: self.worst_utility(constant, prepared, &mut queue),
            })
            .collect()
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("specs", &self.specs.len())
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish()
    }
}
