//! Rank-based descriptive statistics over a multiset of observations.
//!
//! [`compute_stats`] reduces a sequence of numbers to seven summary values:
//! minimum, maximum, mean, median, lower quartile, upper quartile and
//! interquartile range. It never fails: an empty sequence yields the all-zero
//! [`StatsResult`].
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated sum over the frequency table, divided by
//!   `N` and rounded to 3 decimals with round-half-up. If the sum leaves the
//!   `f64` range the table falls back to summing `value × count / N`.
//! - **Quantiles**: rank-index method. For multiplier `p` the target rank is
//!   `(N + 1) × p`. An integral rank selects one value; a fractional rank is
//!   resolved to the pair `(round_half_down, round_half_up)` of whole ranks
//!   and the two values are averaged. With `p ∈ {0.25, 0.5, 0.75}` a `.5`
//!   rank averages its neighbours while `.25` / `.75` ranks collapse onto the
//!   nearest whole rank.
//! - **Resolution**: one ascending pass over the [`FrequencyTable`] with a
//!   running cumulative count. Each statistic takes the first value at which
//!   the count reaches each of its ranks; later values never overwrite it.
//!   Statistics are resolved independently and the pass stops once all of
//!   them are.

use serde::{Deserialize, Serialize};

use crate::collections::FrequencyTable;
use crate::rounding::{round_half_down, round_half_up};

/// Decimal places kept in [`StatsResult::mean`].
pub const MEAN_DECIMALS: i32 = 3;

/// Summary statistics of one sample.
///
/// For a non-empty sample
/// `minimum ≤ lower_quartile ≤ median ≤ upper_quartile ≤ maximum` and
/// `interquartile_range = upper_quartile − lower_quartile`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub minimum: f64,
    pub maximum: f64,
    pub mean: f64,
    pub median: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
    pub interquartile_range: f64,
}

impl StatsResult {
    /// Result reported for an empty sample.
    pub const ZERO: StatsResult = StatsResult {
        minimum: 0.0,
        maximum: 0.0,
        mean: 0.0,
        median: 0.0,
        lower_quartile: 0.0,
        upper_quartile: 0.0,
        interquartile_range: 0.0,
    };

    /// Computes the statistics of an already tallied sample.
    pub fn from_table(table: &FrequencyTable) -> Self {
        let n = table.total_count();
        let (Some(minimum), Some(maximum)) = (table.min(), table.max()) else {
            return Self::ZERO;
        };

        let mean = round_half_up(table.mean(), MEAN_DECIMALS);

        let [lower_quartile, median, upper_quartile] = resolve(
            table,
            [
                RankStatistic::LowerQuartile,
                RankStatistic::Median,
                RankStatistic::UpperQuartile,
            ],
        )
        .map(|value| {
            // ranks are clamped into 1..=n, so every resolver sees its crossing
            debug_assert!(value.is_some(), "rank beyond {n} observations");
            value.unwrap_or(maximum)
        });

        Self {
            minimum,
            maximum,
            mean,
            median,
            lower_quartile,
            upper_quartile,
            interquartile_range: upper_quartile - lower_quartile,
        }
    }

    /// The seven values in declaration order.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64, f64, f64) {
        (
            self.minimum,
            self.maximum,
            self.mean,
            self.median,
            self.lower_quartile,
            self.upper_quartile,
            self.interquartile_range,
        )
    }
}

/// Computes summary statistics of `values`.
///
/// Order of `values` is irrelevant and duplicates are expected. Non-finite
/// entries are skipped with a warning.
///
/// # Complexity
/// Time: O(n log d) for `d` distinct values, Space: O(d)
///
/// # Examples
/// ```
/// use nla_stats::stats::compute_stats;
///
/// let s = compute_stats(&[18.0, 20.0, 23.0, 20.0, 23.0, 27.0, 24.0, 23.0, 29.0]);
/// assert_eq!(s.minimum, 18.0);
/// assert_eq!(s.maximum, 29.0);
/// assert_eq!(s.median, 23.0);
/// assert_eq!(s.lower_quartile, 20.0);
/// assert_eq!(s.upper_quartile, 25.5);
/// assert_eq!(s.interquartile_range, 5.5);
///
/// assert_eq!(compute_stats(&[]), nla_stats::stats::StatsResult::ZERO);
/// ```
pub fn compute_stats(values: &[f64]) -> StatsResult {
    let table: FrequencyTable = values.iter().copied().collect();
    if table.rejected_count() > 0 {
        log::warn!(
            "skipped {} non-finite observation(s) out of {}",
            table.rejected_count(),
            values.len()
        );
    }
    StatsResult::from_table(&table)
}

// ---------------------------------------------------------------------------
// Rank indices
// ---------------------------------------------------------------------------

/// A rank-defined statistic and its multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankStatistic {
    LowerQuartile,
    Median,
    UpperQuartile,
}

impl RankStatistic {
    pub fn multiplier(self) -> f64 {
        match self {
            RankStatistic::LowerQuartile => 0.25,
            RankStatistic::Median => 0.5,
            RankStatistic::UpperQuartile => 0.75,
        }
    }
}

/// Whole ranks (1-indexed) a statistic is read from.
///
/// `second` is `None` when the target rank was integral; otherwise the
/// statistic is the mean of the values at `first` and `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankIndex {
    pub first: u64,
    pub second: Option<u64>,
}

/// Computes the rank index for a sample of size `n` and `multiplier`.
///
/// The target rank is `(n + 1) × multiplier`. Fractional targets are split
/// into `round_half_down` and `round_half_up` of the target. Both ranks are
/// clamped into `1..=n`, which only matters for tiny samples (the upper
/// quartile of a single value targets rank 1.5).
///
/// # Examples
/// ```
/// use nla_stats::stats::{compute_index, RankIndex};
///
/// // odd sample, integral rank
/// assert_eq!(compute_index(11, 0.25), RankIndex { first: 3, second: None });
/// // .5 rank averages its neighbours
/// assert_eq!(compute_index(9, 0.75), RankIndex { first: 7, second: Some(8) });
/// // .25 rank collapses onto the nearest whole rank
/// assert_eq!(compute_index(12, 0.25), RankIndex { first: 3, second: Some(3) });
/// ```
pub fn compute_index(n: u64, multiplier: f64) -> RankIndex {
    let raw = (n + 1) as f64 * multiplier;
    let clamp = |rank: f64| (rank.max(0.0) as u64).clamp(1, n.max(1));

    if raw.fract() == 0.0 {
        RankIndex {
            first: clamp(raw),
            second: None,
        }
    } else {
        RankIndex {
            first: clamp(round_half_down(raw, 0)),
            second: Some(clamp(round_half_up(raw, 0))),
        }
    }
}

/// Tracks the first crossings of one statistic's ranks during a scan.
#[derive(Debug, Clone, Copy)]
struct RankResolver {
    index: RankIndex,
    first: Option<f64>,
    second: Option<f64>,
}

impl RankResolver {
    fn new(index: RankIndex) -> Self {
        Self {
            index,
            first: None,
            second: None,
        }
    }

    /// Feeds one distinct value together with the cumulative count through it.
    fn observe(&mut self, value: f64, ncount: u64) {
        if self.first.is_none() && ncount >= self.index.first {
            self.first = Some(value);
        }
        if let Some(rank) = self.index.second {
            if self.second.is_none() && ncount >= rank {
                self.second = Some(value);
            }
        }
    }

    fn value(&self) -> Option<f64> {
        match (self.first, self.index.second, self.second) {
            (Some(a), None, _) => Some(a),
            (Some(a), Some(_), Some(b)) => Some(midpoint(a, b)),
            _ => None,
        }
    }

    fn is_resolved(&self) -> bool {
        self.value().is_some()
    }
}

/// Mean of two values that stays finite for finite inputs.
fn midpoint(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum / 2.0
    } else {
        a / 2.0 + b / 2.0
    }
}

/// Resolves several rank statistics in one ascending pass over `table`.
///
/// Entries stay `None` only if a rank exceeds the table's total count,
/// which [`compute_index`] rules out.
fn resolve<const K: usize>(
    table: &FrequencyTable,
    statistics: [RankStatistic; K],
) -> [Option<f64>; K] {
    let n = table.total_count();
    let mut resolvers =
        statistics.map(|stat| RankResolver::new(compute_index(n, stat.multiplier())));

    for (value, ncount) in table.cumulative() {
        for resolver in resolvers.iter_mut() {
            resolver.observe(value, ncount);
        }
        if resolvers.iter().all(RankResolver::is_resolved) {
            break;
        }
    }

    resolvers.map(|r| r.value())
}

// ---------------------------------------------------------------------------
// Kahan compensated summation
// ---------------------------------------------------------------------------

/// Neumaier compensated summation for O(ε) error independent of `n`.
///
/// This is an improved variant of Kahan summation that also handles the
/// case where the addend is larger in magnitude than the running sum.
///
/// Reference: Neumaier (1974), "Rundungsfehleranalyse einiger Verfahren
/// zur Summation endlicher Summen", *ZAMM* 54(1), pp. 39–51.
///
/// # Complexity
/// Time: O(n), Space: O(1)
pub fn kahan_sum<I: IntoIterator<Item = f64>>(data: I) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
