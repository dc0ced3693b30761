//! Per-query recall scoring
//!
//! The authoritative score is **positional**: a returned id counts only when it
//! equals the ground-truth id at the same rank, and the denominator is the
//! number of ids the database returned.
//!
//! ```text
//! score = |{ i : actual[i] == expected[i] }| / |actual|
//! ```
//!
//! Consequences worth knowing when reading numbers:
//!
//! - Stricter than set recall: the right neighbors in the wrong order score low.
//! - A short result set is scored over its own length, so returning 3 correct
//!   ids out of k=10 scores 1.0.
//! - An empty result scores 0.0.
//!
//! [`RecallMetric::ExactList`] and [`RecallMetric::SetOverlap`] are kept for
//! comparison runs only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecallMetric {
    /// Same-rank matches over the returned length.
    #[default]
    Positional,
    /// 1.0 when the returned list equals the first `min(k, |expected|)`
    /// ground-truth ids exactly, else 0.0. Empty or short results fail.
    ExactList,
    /// |actual ∩ expected[..k]| / |expected[..k]|, order ignored.
    SetOverlap,
}

impl RecallMetric {
    pub fn score(&self, expected: &[i32], actual: &[i64], k: usize) -> f64 {
        match self {
            RecallMetric::Positional => positional_score(expected, actual),
            RecallMetric::ExactList => {
                if exact_match(expected, actual, k) {
                    1.0
                } else {
                    0.0
                }
            }
            RecallMetric::SetOverlap => set_overlap_score(expected, actual, k),
        }
    }
}

impl std::str::FromStr for RecallMetric {
    type Err = crate::error::BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "positional" => Ok(RecallMetric::Positional),
            "exact_list" | "exact" => Ok(RecallMetric::ExactList),
            "set_overlap" | "set" => Ok(RecallMetric::SetOverlap),
            _ => Err(crate::error::BenchError::config(format!(
                "unknown recall metric '{s}': expected positional, exact_list or set_overlap"
            ))),
        }
    }
}

/// Fraction of rank positions where `actual` agrees with `expected`.
///
/// Positions past the end of `expected` count as misses.
pub fn positional_score(expected: &[i32], actual: &[i64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual
        .iter()
        .zip(expected.iter())
        .filter(|(a, e)| **a == i64::from(**e))
        .count();
    hits as f64 / actual.len() as f64
}

/// Whole-list pass/fail: `actual` is exactly the first `k` ground-truth ids.
pub fn exact_match(expected: &[i32], actual: &[i64], k: usize) -> bool {
    !actual.is_empty()
        && actual.len() == k.min(expected.len())
        && actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| *a == i64::from(*e))
}

/// Order-insensitive recall@k against the first `k` ground-truth ids.
pub fn set_overlap_score(expected: &[i32], actual: &[i64], k: usize) -> f64 {
    let truth: HashSet<i64> = expected.iter().take(k).map(|&id| i64::from(id)).collect();
    if truth.is_empty() {
        return 0.0;
    }
    let mut seen = HashSet::with_capacity(actual.len());
    let hits = actual
        .iter()
        .take(k)
        .filter(|id| truth.contains(*id) && seen.insert(**id))
        .count();
    hits as f64 / truth.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_prefix_scores_one() {
        assert_eq!(positional_score(&[4, 8, 15, 16], &[4, 8, 15]), 1.0);
    }

    #[test]
    fn disjoint_scores_zero() {
        assert_eq!(positional_score(&[1, 2, 3], &[7, 8, 9]), 0.0);
    }

    #[test]
    fn empty_actual_scores_zero() {
        assert_eq!(positional_score(&[1, 2, 3], &[]), 0.0);
        assert_eq!(RecallMetric::SetOverlap.score(&[1, 2], &[], 2), 0.0);
    }

    #[test]
    fn permutation_is_penalised_positionally_but_not_as_a_set() {
        let expected = [10, 20, 30, 40];
        let actual = [20, 10, 30, 40];
        assert_eq!(positional_score(&expected, &actual), 0.5);
        assert_eq!(set_overlap_score(&expected, &actual, 4), 1.0);
        assert!(!exact_match(&expected, &actual, 4));
    }

    #[test]
    fn short_result_inflates_positional_recall() {
        // 3 of k=10 returned, all at the right rank: positional says 1.0 while
        // set recall@10 says 0.3
        let expected: Vec<i32> = (0..10).collect();
        let actual = [0i64, 1, 2];
        assert_eq!(positional_score(&expected, &actual), 1.0);
        assert!((set_overlap_score(&expected, &actual, 10) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn longer_actual_than_expected_counts_overflow_as_misses() {
        assert_eq!(positional_score(&[1, 2], &[1, 2, 3, 4]), 0.5);
        assert!(!exact_match(&[1, 2], &[1, 2, 3], 3));
    }

    #[test]
    fn set_overlap_ignores_duplicates() {
        assert_eq!(set_overlap_score(&[1, 2], &[1, 1], 2), 0.5);
    }

    #[test]
    fn exact_list_fails_empty_and_short_results() {
        assert_eq!(RecallMetric::ExactList.score(&[1, 2, 3], &[], 3), 0.0);
        let expected: Vec<i32> = (0..10).collect();
        assert_eq!(RecallMetric::ExactList.score(&expected, &[0], 10), 0.0);
        assert_eq!(RecallMetric::ExactList.score(&expected, &[0, 1, 2], 10), 0.0);
        let full: Vec<i64> = (0..10).collect();
        assert_eq!(RecallMetric::ExactList.score(&expected, &full, 10), 1.0);
    }

    #[test]
    fn exact_list_caps_length_at_ground_truth() {
        // k larger than the ground-truth row: the whole row is the target
        assert!(exact_match(&[5, 6], &[5, 6], 10));
        assert!(!exact_match(&[5, 6], &[5], 10));
    }

    #[test]
    fn metric_dispatch() {
        assert_eq!(RecallMetric::ExactList.score(&[1, 2, 3], &[1, 2], 2), 1.0);
        assert_eq!(RecallMetric::ExactList.score(&[1, 2, 3], &[2, 1], 2), 0.0);
        assert_eq!(RecallMetric::default(), RecallMetric::Positional);
    }
}
