//! Evaluator and simulation integration tests

use std::collections::VecDeque;
use std::sync::Arc;

use bias_core::{
    AccessObserver, BiasConstant, Candidate, Evaluator, HardwareSpec, IntervalQueue,
    SimulationConfig, SimulationOutcome, SparseUtilityCache, UtilityTracker, simulate_search,
};

/// Forwards accesses to a tracker while recording them
struct Tap<'a> {
    tracker: &'a mut UtilityTracker,
    seen: Vec<i64>,
}

impl AccessObserver for Tap<'_> {
    fn access(&mut self, index: i64) -> bool {
        self.seen.push(index);
        self.tracker.access(index)
    }
}

/// First probe at `from`, then plain breadth-first midpoints over the rest
fn plain_progression(from: i64, to: i64, n: usize) -> Vec<i64> {
    let mut out = vec![from];
    let mut pending = VecDeque::from([(from + 1, to - 1)]);
    while out.len() < n {
        let Some((low, high)) = pending.pop_front() else {
            break;
        };
        if low > high {
            continue;
        }
        let mid = (low + high) / 2;
        out.push(mid);
        pending.push_back((low, mid - 1));
        pending.push_back((mid + 1, high));
    }
    out
}

fn eight_set_spec() -> HardwareSpec {
    HardwareSpec::builder("8 sets, 64 byte lines")
        .number_of_sets(8)
        .block_size_in_bytes(64)
        .min_array_size_in_bytes(1024)
        .build()
        .unwrap()
}

fn evaluator(specs: Vec<HardwareSpec>) -> Evaluator {
    Evaluator::new(specs, SimulationConfig::default(), Arc::new(SparseUtilityCache::new())).unwrap()
}

#[test]
fn test_zero_constant_follows_plain_midpoints() {
    let spec = eight_set_spec();
    let shift = spec.line_shift(4).unwrap();
    let mut tracker = UtilityTracker::for_spec(&spec, shift, SimulationConfig::default().scores());
    let mut tap = Tap {
        tracker: &mut tracker,
        seen: Vec::new(),
    };
    let mut queue = IntervalQueue::default();

    let outcome = simulate_search(BiasConstant::new(0), 0, 1024, &mut tap, &mut queue);
    let seen = tap.seen;

    assert_eq!(outcome, SimulationOutcome::Completed);
    assert_eq!(seen, plain_progression(0, 1024, seen.len()));
    // lines 0, 32, 16, 48 all land in set 0; the fifth probe ends the run
    assert_eq!(seen, vec![0, 512, 256, 768, 128]);
    assert_eq!(tracker.first_failure_count(), 1);
    assert_eq!(tracker.third_failure_count(), 1);
    assert_eq!(tracker.utility(), 0.0);
}

#[test]
fn test_zero_constant_scores_zero_on_eight_sets() {
    let evaluator = evaluator(vec![eight_set_spec()]);
    assert_eq!(evaluator.compute_utility(BiasConstant::new(0)), 0.0);
    let shipped = evaluator.compute_utility(BiasConstant::new(79_643_643));
    assert!(shipped >= 0.0);
}

#[test]
fn test_memoized_utility_is_bit_identical() {
    let evaluator = evaluator(HardwareSpec::default_catalog());
    let value = BiasConstant::new(0x04BF_33FB);

    let first = evaluator.utility(value);
    let second = evaluator.utility(value);
    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(first.to_bits(), evaluator.compute_utility(value).to_bits());

    let stats = evaluator.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_candidates_equal_across_evaluators() {
    let narrow = evaluator(vec![eight_set_spec()]);
    let wide = evaluator(HardwareSpec::default_catalog());
    let value = BiasConstant::new(0x0123_4567);

    let a = Candidate::evaluate(value, &narrow);
    let b = Candidate::evaluate(value, &wide);
    assert_eq!(a, b);
    assert_eq!(a.spec_utilities(&narrow).len(), 1);
    assert_eq!(b.spec_utilities(&wide).len(), 7);
}

#[test]
fn test_breakdown_sticks_to_first_evaluator() {
    let narrow = evaluator(vec![eight_set_spec()]);
    let wide = evaluator(HardwareSpec::default_catalog());
    let candidate = Candidate::evaluate(BiasConstant::new(0x0123_4567), &narrow);

    let first = candidate.spec_utilities(&narrow).to_vec();
    assert_eq!(first.len(), 1);
    let again = candidate.spec_utilities(&wide);
    assert_eq!(again, first.as_slice());

    // a fresh candidate of the same value computes its own breakdown
    let other = Candidate::from_parts(candidate.value(), candidate.utility());
    assert_eq!(other.spec_utilities(&wide).len(), 7);
}

#[test]
fn test_breakdown_matches_worst() {
    let specs = HardwareSpec::default_catalog();
    let evaluator = evaluator(specs.clone());
    let value = BiasConstant::new(79_643_643);
    let candidate = Candidate::evaluate(value, &evaluator);

    for (entry, spec) in candidate.spec_utilities(&evaluator).iter().zip(&specs) {
        assert_eq!(&entry.spec, spec);
        assert_eq!(entry.utility, evaluator.worst(value, spec).unwrap().utility());
    }
}

#[test]
fn test_tiny_queue_degrades_without_failing() {
    let config = SimulationConfig {
        max_magnitude: 16,
        queue_capacity: 2,
        ..SimulationConfig::default()
    };
    let evaluator = Evaluator::new(
        HardwareSpec::default_catalog()
            .into_iter()
            .filter(|spec| spec.block_size_in_bytes() <= 128)
            .collect(),
        config,
        Arc::new(SparseUtilityCache::new()),
    )
    .unwrap();
    let utility = evaluator.compute_utility(BiasConstant::new(0x0ABC_DEF0));
    assert!(utility.is_finite());
    assert!(utility >= 0.0);
}
