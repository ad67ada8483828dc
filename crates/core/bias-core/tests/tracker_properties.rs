//! Property tests for access tracking

use std::collections::HashMap;

use bias_core::{TrackerScores, UtilityTracker};
use proptest::prelude::*;

/// Strictly increasing line ids built from positive gaps
fn increasing_lines() -> impl Strategy<Value = Vec<u32>> {
    (0u32..100, prop::collection::vec(1u32..6, 1..200)).prop_map(|(start, gaps)| {
        gaps.iter()
            .scan(start, |line, gap| {
                *line += gap;
                Some(*line)
            })
            .collect()
    })
}

/// Position of the access that is the fourth one into its set
fn fourth_access_in_set(lines: &[u32], set_mask: u32) -> Option<usize> {
    let mut per_set: HashMap<u32, u32> = HashMap::new();
    lines.iter().position(|line| {
        let count = per_set.entry(line & set_mask).or_default();
        *count += 1;
        *count == 4
    })
}

fn expected_score(t: &UtilityTracker) -> f32 {
    let term = |count: u32| {
        if count == 0 {
            15.0
        } else {
            f64::from(count.ilog2())
        }
    };
    (term(t.first_failure_count())
        + term(t.second_failure_count()) / 100.0
        + term(t.third_failure_count()) / 10_000.0) as f32
}

proptest! {
    /// Distinct increasing lines only finish on the access after the fourth
    /// access into one set
    #[test]
    fn prop_distinct_lines_finish_after_fourth_in_set(
        lines in increasing_lines(),
        sets_log in 0u32..=6,
        shift in 0u32..=6,
    ) {
        let sets = 1u32 << sets_log;
        let mut tracker = UtilityTracker::new(sets, shift, TrackerScores::default());
        let fourth = fourth_access_in_set(&lines, sets - 1);

        for (i, line) in lines.iter().enumerate() {
            let done = tracker.access_array_location(i64::from(line << shift));
            match fourth {
                Some(p) if i > p => {
                    prop_assert!(done, "access {} should finish (fourth at {})", i, p);
                    break;
                }
                _ => prop_assert!(!done, "access {} finished early", i),
            }
        }

        if fourth.is_none_or(|p| p + 1 >= lines.len()) {
            prop_assert!(!tracker.is_done());
            prop_assert_eq!(tracker.utility(), 14.0);
        } else {
            prop_assert!(tracker.is_done());
            prop_assert_eq!(tracker.utility(), expected_score(&tracker));
        }
    }

    /// Revisiting a line finishes the run immediately
    #[test]
    fn prop_repeat_line_finishes(
        lines in increasing_lines(),
        pick in any::<prop::sample::Index>(),
        sets_log in 3u32..=9,
    ) {
        let sets = 1u32 << sets_log;
        let mut tracker = UtilityTracker::new(sets, 4, TrackerScores::default());
        let fourth = fourth_access_in_set(&lines, sets - 1);
        let prefix = fourth.map_or(lines.len(), |p| p + 1);

        for line in &lines[..prefix] {
            prop_assert!(!tracker.access_array_location(i64::from(line << 4)));
        }
        let repeat = lines[pick.index(prefix)];
        prop_assert!(tracker.access_array_location(i64::from(repeat << 4)));
        prop_assert_eq!(tracker.utility(), expected_score(&tracker));
    }

    /// Failure counts are recorded in escalation order
    #[test]
    fn prop_failure_counts_are_ordered(lines in increasing_lines(), sets_log in 0u32..=5) {
        let sets = 1u32 << sets_log;
        let mut tracker = UtilityTracker::new(sets, 0, TrackerScores::default());
        for line in &lines {
            if tracker.access_array_location(i64::from(*line)) {
                break;
            }
        }
        let (a, b, c) = (
            tracker.first_failure_count(),
            tracker.second_failure_count(),
            tracker.third_failure_count(),
        );
        prop_assert!(b == 0 || a > 0);
        prop_assert!(c == 0 || b > 0);
        prop_assert!(a <= sets && b <= sets && c <= sets);
    }
}
