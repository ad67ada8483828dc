//! Evaluated population members

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::constant::BiasConstant;
use crate::evaluator::{Evaluator, SpecUtility};

/// A bias constant together with its fitness.
///
/// Identity is the constant alone: two candidates with the same value are
/// interchangeable no matter which evaluator produced them. The per-spec
/// breakdown is only needed for reporting and is filled in on first request.
#[derive(Debug, Clone)]
pub struct Candidate {
    value: BiasConstant,
    utility: f32,
    breakdown: OnceLock<Vec<SpecUtility>>,
}

impl Candidate {
    /// Evaluate `value`, reusing a memoized utility when there is one
    pub fn evaluate(value: BiasConstant, evaluator: &Evaluator) -> Self {
        Self::from_parts(value, evaluator.utility(value))
    }

    /// Candidate with an already known utility
    pub fn from_parts(value: BiasConstant, utility: f32) -> Self {
        Self {
            value,
            utility,
            breakdown: OnceLock::new(),
        }
    }

    pub fn value(&self) -> BiasConstant {
        self.value
    }

    pub fn utility(&self) -> f32 {
        self.utility
    }

    /// Worst utility per hardware spec, computed once.
    ///
    /// The breakdown comes from the first evaluator passed in and is returned
    /// as is on later calls, whatever evaluator they pass. Clones made after
    /// that first call share the same breakdown.
    pub fn spec_utilities(&self, evaluator: &Evaluator) -> &[SpecUtility] {
        self.breakdown
            .get_or_init(|| evaluator.spec_utilities(self.value))
    }

    /// Ranking order: higher utility first
    pub fn rank(a: &Self, b: &Self) -> Ordering {
        b.utility.total_cmp(&a.utility)
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Candidate {}

impl Hash for Candidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
