//! Throttling of metric recomputation per (metric, group) pair.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::entities::GroupId;

/// Default recomputation interval: one week.
pub const DEFAULT_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

/// Decides whether a metric is due for a group.
#[cfg_attr(test, mockall::automock)]
pub trait ScheduleGate {
    /// `true` if `metric` has not run for `group` within `interval` of `now`.
    fn is_due(&self, metric: &str, group: GroupId, interval: Duration, now: DateTime<Utc>) -> bool;

    /// Records that `metric` ran for `group` at `now`.
    fn record_run(&mut self, metric: &str, group: GroupId, now: DateTime<Utc>);
}

/// Gate that remembers the last run of every (metric, group) pair in memory.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use nla_stats::schedule::{LastRunGate, ScheduleGate};
///
/// let mut gate = LastRunGate::new();
/// let t0 = Utc.timestamp_opt(1_000_000, 0).unwrap();
/// let week = Duration::weeks(1);
///
/// assert!(gate.is_due("last_login_interval", 2, week, t0));
/// gate.record_run("last_login_interval", 2, t0);
/// assert!(!gate.is_due("last_login_interval", 2, week, t0 + Duration::days(6)));
/// assert!(gate.is_due("last_login_interval", 2, week, t0 + Duration::days(7)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LastRunGate {
    last_runs: HashMap<(String, GroupId), DateTime<Utc>>,
}

impl LastRunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_run(&self, metric: &str, group: GroupId) -> Option<DateTime<Utc>> {
        self.last_runs.get(&(metric.to_string(), group)).copied()
    }
}

impl ScheduleGate for LastRunGate {
    fn is_due(&self, metric: &str, group: GroupId, interval: Duration, now: DateTime<Utc>) -> bool {
        match self.last_run(metric, group) {
            None => true,
            Some(last) => now - last >= interval,
        }
    }

    fn record_run(&mut self, metric: &str, group: GroupId, now: DateTime<Utc>) {
        self.last_runs.insert((metric.to_string(), group), now);
    }
}
