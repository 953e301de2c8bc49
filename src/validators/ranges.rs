//! Random table coverage
//!
//! Random table cases select integer ranges of the random number. A table
//! is well formed when no number is selected by two cases and every number
//! the player can draw is selected by some case.

use std::ops::RangeInclusive;

/// Numbers drawn from the random number table
pub const RANDOM_RANGE: RangeInclusive<i64> = 0..=9;

/// Numbers drawn when a zero counts as ten
pub const RANDOM_RANGE_ZERO_AS_TEN: RangeInclusive<i64> = 1..=10;

/// Result of a coverage check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coverage {
    /// Some number is inside two or more ranges
    pub overlapped: bool,
    /// Some expected number is inside no range
    pub missing: bool,
}

/// Check `ranges` against `expected`. Inverted ranges (`from > to`) are
/// ignored.
pub fn check_coverage(ranges: &[(i64, i64)], expected: RangeInclusive<i64>) -> Coverage {
    let mut sorted: Vec<(i64, i64)> = ranges.iter().copied().filter(|(f, t)| f <= t).collect();
    sorted.sort_unstable();

    let mut coverage = Coverage::default();

    let mut covered_to: Option<i64> = None;
    for (from, to) in &sorted {
        if covered_to.is_some_and(|end| *from <= end) {
            coverage.overlapped = true;
        }
        covered_to = Some(covered_to.map_or(*to, |end| end.max(*to)));
    }

    let (start, end) = (*expected.start(), *expected.end());
    let mut next = start;
    for (from, to) in &sorted {
        if next > end || *from > next {
            break;
        }
        next = next.max(to.saturating_add(1));
    }
    coverage.missing = next <= end;

    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_coverage() {
        let coverage = check_coverage(&[(0, 4), (5, 9)], RANDOM_RANGE);
        assert_eq!(coverage, Coverage::default());
    }

    #[test]
    fn test_gap() {
        let coverage = check_coverage(&[(0, 3), (5, 9)], RANDOM_RANGE);
        assert!(coverage.missing);
        assert!(!coverage.overlapped);
    }

    #[test]
    fn test_overlap() {
        let coverage = check_coverage(&[(0, 5), (5, 9)], RANDOM_RANGE);
        assert!(coverage.overlapped);
        assert!(!coverage.missing);
    }

    #[test]
    fn test_zero_as_ten() {
        let ranges = [(1, 5), (6, 10)];
        assert!(!check_coverage(&ranges, RANDOM_RANGE_ZERO_AS_TEN).missing);
        assert!(check_coverage(&ranges, RANDOM_RANGE).missing);
    }

    #[test]
    fn test_inverted_ranges_ignored() {
        let coverage = check_coverage(&[(9, 0), (0, 9)], RANDOM_RANGE);
        assert_eq!(coverage, Coverage::default());
    }

    #[test]
    fn test_ranges_outside_expected() {
        let coverage = check_coverage(&[(-5, 20)], RANDOM_RANGE);
        assert_eq!(coverage, Coverage::default());
    }

    fn naive(ranges: &[(i64, i64)], expected: RangeInclusive<i64>) -> Coverage {
        let mut hits = std::collections::HashMap::new();
        for (from, to) in ranges.iter().filter(|(f, t)| f <= t) {
            for n in *from..=*to {
                *hits.entry(n).or_insert(0) += 1;
            }
        }
        Coverage {
            overlapped: hits.values().any(|count| *count > 1),
            missing: expected.into_iter().any(|n| !hits.contains_key(&n)),
        }
    }

    proptest! {
        #[test]
        fn prop_matches_per_number_count(
            ranges in prop::collection::vec((-2i64..13, -2i64..13), 0..6),
            zero_as_ten in any::<bool>(),
        ) {
            let expected = if zero_as_ten { RANDOM_RANGE_ZERO_AS_TEN } else { RANDOM_RANGE };
            prop_assert_eq!(check_coverage(&ranges, expected.clone()), naive(&ranges, expected));
        }
    }
}
