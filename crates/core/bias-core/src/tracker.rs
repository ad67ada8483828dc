//! Access tracking for one simulated binary search
//!
//! [`UtilityTracker`] replays array-index accesses against a single cache/TLB
//! geometry and scores how long the search manages to spread its probes across
//! distinct sets before it is forced into set conflicts, or before it starts
//! touching lines/pages it has already loaded.
//!
//! Each set escalates through three tiers:
//!
//! - first visit marks tier 1
//! - second visit marks tier 2 and records `|tier 1|` as the first failure
//! - third visit marks tier 3 and records `|tier 2|` as the second failure
//! - fourth visit records `|tier 3|` as the third failure
//!
//! The run ends on the access after the third failure, or on the first access
//! to an already-visited line.

use rustc_hash::FxHashSet;

use crate::hardware::HardwareSpec;

/// Receives the index of every simulated array access.
///
/// Returning `true` ends the simulation.
pub trait AccessObserver {
    fn access(&mut self, index: i64) -> bool;
}

/// Constants used when turning failure counts into a utility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerScores {
    /// Reported when the run never completed
    pub incomplete: f32,
    /// Substituted for `log2(count)` when a failure was never observed
    pub unobserved: f32,
}

impl Default for TrackerScores {
    fn default() -> Self {
        Self {
            incomplete: 14.0,
            unobserved: 15.0,
        }
    }
}

/// Small bitmap over set indices that tracks its own population count
#[derive(Debug, Clone)]
struct SetBits {
    words: Vec<u64>,
    count: u32,
}

impl SetBits {
    fn new(bits: u32) -> Self {
        Self {
            words: vec![0; (bits as usize).div_ceil(64)],
            count: 0,
        }
    }

    #[inline]
    fn contains(&self, idx: u32) -> bool {
        self.words[(idx >> 6) as usize] & (1u64 << (idx & 63)) != 0
    }

    #[inline]
    fn insert(&mut self, idx: u32) {
        let word = &mut self.words[(idx >> 6) as usize];
        let bit = 1u64 << (idx & 63);
        if *word & bit == 0 {
            *word |= bit;
            self.count += 1;
        }
    }

    #[inline]
    fn count(&self) -> u32 {
        self.count
    }
}

/// Per-run simulation state for one hardware spec
#[derive(Debug, Clone)]
pub struct UtilityTracker {
    tier1: SetBits,
    tier2: SetBits,
    tier3: SetBits,
    visited: FxHashSet<u32>,
    line_shift: u32,
    set_mask: u32,
    scores: TrackerScores,
    utility: f32,
    done: bool,
    first_failure: u32,
    second_failure: u32,
    third_failure: u32,
}

impl UtilityTracker {
    /// Create a tracker for a geometry with `number_of_sets` sets, where an
    /// element index is converted to a line id by shifting right `line_shift`.
    pub fn new(number_of_sets: u32, line_shift: u32, scores: TrackerScores) -> Self {
        debug_assert!(number_of_sets.is_power_of_two());
        Self {
            tier1: SetBits::new(number_of_sets),
            tier2: SetBits::new(number_of_sets),
            tier3: SetBits::new(number_of_sets),
            visited: FxHashSet::default(),
            line_shift,
            set_mask: number_of_sets - 1,
            scores,
            utility: 0.0,
            done: false,
            first_failure: 0,
            second_failure: 0,
            third_failure: 0,
        }
    }

    /// Tracker for `spec` with a line shift from [`HardwareSpec::line_shift`]
    pub fn for_spec(spec: &HardwareSpec, line_shift: u32, scores: TrackerScores) -> Self {
        Self::new(spec.number_of_sets(), line_shift, scores)
    }

    /// Whether the run has finished
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Distinct sets touched before the first conflict (0 if none yet)
    pub fn first_failure_count(&self) -> u32 {
        self.first_failure
    }

    pub fn second_failure_count(&self) -> u32 {
        self.second_failure
    }

    pub fn third_failure_count(&self) -> u32 {
        self.third_failure
    }

    /// Score of the run; the incomplete sentinel until the run is done
    pub fn utility(&self) -> f32 {
        if self.done {
            self.utility
        } else {
            self.scores.incomplete
        }
    }

    /// Simulate an access to array element `index`.
    ///
    /// Returns `true` once the simulation should stop.
    pub fn access_array_location(&mut self, index: i64) -> bool {
        if self.done {
            return true;
        }

        // 32-bit index semantics, logical shift
        let line = (index as u32) >> self.line_shift;

        if self.third_failure > 0 || self.visited.contains(&line) {
            self.utility = self.score();
            self.done = true;
            return true;
        }

        self.visited.insert(line);

        let set = line & self.set_mask;
        if !self.tier1.contains(set) {
            self.tier1.insert(set);
            return false;
        }
        if self.first_failure == 0 {
            self.first_failure = self.tier1.count();
        }
        if !self.tier2.contains(set) {
            self.tier2.insert(set);
            return false;
        }
        if self.second_failure == 0 {
            self.second_failure = self.tier2.count();
        }
        if !self.tier3.contains(set) {
            self.tier3.insert(set);
            return false;
        }
        if self.third_failure == 0 {
            self.third_failure = self.tier3.count();
        }
        false
    }

    fn score(&self) -> f32 {
        let term = |count: u32| -> f64 {
            if count == 0 {
                f64::from(self.scores.unobserved)
            } else {
                f64::from(count.ilog2())
            }
        };
        let utility = term(self.first_failure)
            + term(self.second_failure) / 100.0
            + term(self.third_failure) / 10_000.0;
        utility as f32
    }
}

impl AccessObserver for UtilityTracker {
    #[inline]
    fn access(&mut self, index: i64) -> bool {
        self.access_array_location(index)
    }
}
