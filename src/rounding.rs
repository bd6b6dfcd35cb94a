//! Decimal rounding with an explicit tie-breaking direction.
//!
//! `f64::round` always breaks ties away from zero and formatting-based
//! rounding follows round-half-even, so neither reproduces the fixtures the
//! statistics are checked against. This module rounds to a fixed number of
//! decimal places and lets the caller choose which way an exact half goes.
//!
//! # Tie detection
//!
//! Scaling by `10^places` is inexact: `1.0005 × 1000` evaluates to
//! `1000.4999999999999`. A scaled fraction within a few ULPs of `0.5` is
//! therefore treated as a tie before the direction is applied. The slack is
//! capped at [`MAX_TIE_SLACK`], and a scaled value of `2^52` or more has no
//! fractional bits at all, so such values are returned unchanged.

/// Direction in which an exact half is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// `2.5 → 3`, `-2.5 → -3` (away from zero).
    HalfUp,
    /// `2.5 → 2`, `-2.5 → -2` (towards zero).
    HalfDown,
}

/// Relative tolerance, in units of `f64::EPSILON`, for recognising a tie.
const TIE_ULPS: f64 = 16.0;

/// Upper bound on the absolute distance from `0.5` still counted as a tie.
pub const MAX_TIE_SLACK: f64 = 1e-6;

/// Smallest magnitude at which every `f64` is an integer.
const INTEGRAL_THRESHOLD: f64 = 4_503_599_627_370_496.0; // 2^52

/// Rounds `value` to `places` decimal places using `mode` for ties.
///
/// Non-tie values round to the nearest representable result regardless of
/// `mode`. Non-finite input is returned unchanged.
///
/// # Examples
/// ```
/// use nla_stats::rounding::{round, RoundingMode};
/// assert_eq!(round(2.5, 0, RoundingMode::HalfUp), 3.0);
/// assert_eq!(round(2.5, 0, RoundingMode::HalfDown), 2.0);
/// assert_eq!(round(2.75, 0, RoundingMode::HalfDown), 3.0);
/// assert_eq!(round(4.41666, 3, RoundingMode::HalfUp), 4.417);
/// ```
pub fn round(value: f64, places: i32, mode: RoundingMode) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    let scaled = value.abs() * factor;
    if scaled >= INTEGRAL_THRESHOLD {
        return value;
    }
    let floor = scaled.floor();
    let frac = scaled - floor;

    let slack = (TIE_ULPS * f64::EPSILON * scaled.max(1.0)).min(MAX_TIE_SLACK);
    let is_tie = (frac - 0.5).abs() <= slack;
    let rounded = if is_tie {
        match mode {
            RoundingMode::HalfUp => floor + 1.0,
            RoundingMode::HalfDown => floor,
        }
    } else {
        scaled.round()
    };

    value.signum() * rounded / factor
}

/// Rounds to `places` decimals, resolving ties away from zero.
pub fn round_half_up(value: f64, places: i32) -> f64 {
    round(value, places, RoundingMode::HalfUp)
}

/// Rounds to `places` decimals, resolving ties towards zero.
pub fn round_half_down(value: f64, places: i32) -> f64 {
    round(value, places, RoundingMode::HalfDown)
}
