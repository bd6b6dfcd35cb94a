//! # nla-stats
//!
//! Descriptive statistics for learning-analytics metrics.
//!
//! The heart of the crate is [`stats::compute_stats`], which reduces a
//! multiset of observations to minimum, maximum, mean, median, quartiles and
//! interquartile range using a frequency-table, rank-index quantile method.
//! Around it sit small, trait-based collaborators for running the metrics
//! against groups of members on a schedule.
//!
//! ## Modules
//!
//! - [`stats`] — Rank-based summary statistics (the engine)
//! - [`collections`] — Frequency table over observations
//! - [`rounding`] — Decimal rounding with explicit tie direction
//! - [`metrics`] — Members → observations
//! - [`entities`] — Groups, members and inclusion policy
//! - [`schedule`] — Per (metric, group) recomputation throttling
//! - [`sink`] — Result persistence
//! - [`analyze`] — Orchestration of a full analysis run
//! - [`config`] — TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Total core**: the statistics never fail; an empty sample maps to zeros
//! - **Reproducible rounding**: ties are resolved explicitly, never by the
//!   platform's default rounding
//! - **Property-based testing**: invariants verified via proptest

pub mod analyze;
pub mod collections;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod rounding;
pub mod schedule;
pub mod sink;
pub mod stats;

pub use analyze::{Analyzer, RunSummary};
pub use config::NlaConfig;
pub use error::{NlaError, NlaResult};
pub use stats::{compute_stats, StatsResult};
