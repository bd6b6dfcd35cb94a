//! Frequency table over numeric observations.
//!
//! Tallies how often each distinct value occurs and iterates the distinct
//! values in ascending numeric order. This is the only structure the rank
//! statistics in [`crate::stats`] need: walking the table while accumulating
//! counts visits every rank of the sorted sample without materialising the
//! sorted sample itself.
//!
//! # Keys
//!
//! Values are keyed by [`OrderedFloat`] so that `f64` gets a total order.
//! Non-finite observations are rejected at insertion, so NaN never becomes
//! a key and `-0.0` / `0.0` collapse into one entry.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::stats::kahan_sum;

/// Ascending map of distinct value → occurrence count.
///
/// # Examples
/// ```
/// use nla_stats::collections::FrequencyTable;
///
/// let table: FrequencyTable = [3.0, 1.0, 3.0, 2.0].into_iter().collect();
/// assert_eq!(table.total_count(), 4);
/// assert_eq!(table.distinct_count(), 3);
/// assert_eq!(table.min(), Some(1.0));
/// assert_eq!(table.max(), Some(3.0));
/// assert_eq!(table.count_of(3.0), 2);
/// assert_eq!(table.sum(), 9.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    counts: BTreeMap<OrderedFloat<f64>, u64>,
    total: u64,
    rejected: u64,
}

impl FrequencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation of `value`.
    ///
    /// Returns `false` (and records nothing) if `value` is NaN or infinite.
    pub fn insert(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            self.rejected += 1;
            return false;
        }
        // fold -0.0 into 0.0 so both share a key
        let key = OrderedFloat(value + 0.0);
        *self.counts.entry(key).or_insert(0) += 1;
        self.total += 1;
        true
    }

    /// Total number of recorded observations, `N`.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of distinct values.
    pub fn distinct_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of non-finite observations that were skipped.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Returns `true` if no observation has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Occurrences of `value` (zero if never seen).
    pub fn count_of(&self, value: f64) -> u64 {
        self.counts
            .get(&OrderedFloat(value + 0.0))
            .copied()
            .unwrap_or(0)
    }

    /// Smallest recorded value.
    pub fn min(&self) -> Option<f64> {
        self.counts.keys().next().map(|k| k.0)
    }

    /// Largest recorded value.
    pub fn max(&self) -> Option<f64> {
        self.counts.keys().next_back().map(|k| k.0)
    }

    /// Sum of all observations, `T`.
    ///
    /// Each distinct value contributes `value × count`; the contributions are
    /// accumulated with compensated summation in ascending key order, so the
    /// result does not depend on the order observations were inserted in.
    pub fn sum(&self) -> f64 {
        kahan_sum(self.iter().map(|(value, count)| value * count as f64))
    }

    /// Arithmetic mean `T / N`, or `0.0` for an empty table.
    ///
    /// When `T` leaves the `f64` range the mean is accumulated from halved,
    /// pre-weighted contributions instead, so a finite sample always has a
    /// finite mean inside `[min, max]`.
    pub fn mean(&self) -> f64 {
        let (Some(min), Some(max)) = (self.min(), self.max()) else {
            return 0.0;
        };
        let n = self.total as f64;
        let sum = self.sum();
        let mean = if sum.is_finite() {
            sum / n
        } else {
            2.0 * kahan_sum(
                self.iter()
                    .map(|(value, count)| value / 2.0 * (count as f64 / n)),
            )
        };
        mean.clamp(min, max)
    }

    /// Iterates `(value, count)` pairs in ascending value order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (f64, u64)> + '_ {
        self.counts.iter().map(|(k, &c)| (k.0, c))
    }

    /// Iterates `(value, cumulative_count)` pairs in ascending value order.
    ///
    /// The cumulative count of a value is the rank of its last occurrence in
    /// the sorted sample.
    pub fn cumulative(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.iter().scan(0u64, |running, (value, count)| {
            *running += count;
            Some((value, *running))
        })
    }

    /// Value at 1-indexed `rank` of the sorted sample.
    ///
    /// Returns `None` when `rank` is zero or exceeds [`total_count`](Self::total_count).
    pub fn value_at_rank(&self, rank: u64) -> Option<f64> {
        if rank == 0 {
            return None;
        }
        self.cumulative()
            .find(|&(_, running)| running >= rank)
            .map(|(value, _)| value)
    }
}

impl FromIterator<f64> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl Extend<f64> for FrequencyTable {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let table = FrequencyTable::new();
        assert!(table.is_empty());
        assert_eq!(table.total_count(), 0);
        assert_eq!(table.distinct_count(), 0);
        assert_eq!(table.min(), None);
        assert_eq!(table.max(), None);
        assert_eq!(table.sum(), 0.0);
        assert_eq!(table.mean(), 0.0);
        assert_eq!(table.value_at_rank(1), None);
    }

    #[test]
    fn test_counts_duplicates() {
        let table: FrequencyTable = [7.0, 8.0, 9.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 5.0, 6.0]
            .into_iter()
            .collect();
        assert_eq!(table.total_count(), 12);
        assert_eq!(table.distinct_count(), 9);
        assert_eq!(table.count_of(3.0), 3);
        assert_eq!(table.count_of(2.0), 2);
        assert_eq!(table.count_of(10.0), 0);
        assert_eq!(table.sum(), 53.0);
    }

    #[test]
    fn test_mean() {
        let table: FrequencyTable = [4.0, 1.0, 3.0, 2.0].into_iter().collect();
        assert_eq!(table.mean(), 2.5);
    }

    #[test]
    fn test_mean_survives_overflowing_sum() {
        let table: FrequencyTable = [f64::MAX; 3].into_iter().collect();
        assert!(!table.sum().is_finite());
        assert_eq!(table.mean(), f64::MAX);

        let table: FrequencyTable = [f64::MAX, f64::MAX / 2.0].into_iter().collect();
        assert_eq!(table.mean(), f64::MAX * 0.75);

        let table: FrequencyTable = [-f64::MAX, -f64::MAX].into_iter().collect();
        assert_eq!(table.mean(), -f64::MAX);
    }

    #[test]
    fn test_ascending_iteration() {
        let table: FrequencyTable = [5.0, -1.0, 3.5, 3.5, 0.0].into_iter().collect();
        let pairs: Vec<(f64, u64)> = table.iter().collect();
        assert_eq!(pairs, vec![(-1.0, 1), (0.0, 1), (3.5, 2), (5.0, 1)]);
    }

    #[test]
    fn test_cumulative_counts() {
        let table: FrequencyTable = [18.0, 20.0, 23.0, 20.0, 23.0, 27.0, 24.0, 23.0, 29.0]
            .into_iter()
            .collect();
        let cumulative: Vec<(f64, u64)> = table.cumulative().collect();
        assert_eq!(
            cumulative,
            vec![(18.0, 1), (20.0, 3), (23.0, 6), (24.0, 7), (27.0, 8), (29.0, 9)]
        );
    }

    #[test]
    fn test_value_at_rank() {
        let table: FrequencyTable = [11.0, 4.0, 6.0, 8.0, 3.0, 10.0, 8.0, 10.0, 4.0, 12.0, 31.0]
            .into_iter()
            .collect();
        assert_eq!(table.value_at_rank(0), None);
        assert_eq!(table.value_at_rank(1), Some(3.0));
        assert_eq!(table.value_at_rank(3), Some(4.0));
        assert_eq!(table.value_at_rank(9), Some(11.0));
        assert_eq!(table.value_at_rank(11), Some(31.0));
        assert_eq!(table.value_at_rank(12), None);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut table = FrequencyTable::new();
        assert!(table.insert(1.0));
        assert!(!table.insert(f64::NAN));
        assert!(!table.insert(f64::INFINITY));
        assert!(!table.insert(f64::NEG_INFINITY));
        assert_eq!(table.total_count(), 1);
        assert_eq!(table.rejected_count(), 3);
    }

    #[test]
    fn test_signed_zero_shares_key() {
        let table: FrequencyTable = [0.0, -0.0].into_iter().collect();
        assert_eq!(table.distinct_count(), 1);
        assert_eq!(table.count_of(0.0), 2);
        assert_eq!(table.count_of(-0.0), 2);
    }
}
