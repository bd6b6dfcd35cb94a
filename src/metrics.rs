//! Metrics: turning a group's members into a sequence of observations.
//!
//! Every metric implements [`MetricSource`]. The resulting `Vec<f64>` is a
//! plain, restartable sequence that is handed straight to
//! [`compute_stats`](crate::stats::compute_stats).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::entities::Member;
use crate::error::NlaError;

/// Produces one numeric observation per qualifying member.
pub trait MetricSource {
    /// Observations for `members`, measured relative to `reference`.
    fn to_numeric_sequence(&self, members: &[Member], reference: DateTime<Utc>) -> Vec<f64>;
}

/// Seconds elapsed between each member's last activity and the reference time.
///
/// Members that were never active are left out rather than counted as zero.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use nla_stats::entities::Member;
/// use nla_stats::metrics::{LastLoginInterval, MetricSource};
///
/// let now = Utc.timestamp_opt(1_509_584_382, 0).unwrap();
/// let members = [
///     Member { id: 1, last_activity: None },
///     Member { id: 2, last_activity: Some(Utc.timestamp_opt(1_509_584_381, 0).unwrap()) },
/// ];
/// assert_eq!(LastLoginInterval.to_numeric_sequence(&members, now), vec![1.0]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastLoginInterval;

impl MetricSource for LastLoginInterval {
    fn to_numeric_sequence(&self, members: &[Member], reference: DateTime<Utc>) -> Vec<f64> {
        members
            .iter()
            .filter_map(|m| m.last_activity)
            .map(|last| (reference - last).num_seconds() as f64)
            .collect()
    }
}

/// Metric that ignores its members and yields a fixed sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMetric {
    values: Vec<f64>,
}

impl StaticMetric {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl MetricSource for StaticMetric {
    fn to_numeric_sequence(&self, _members: &[Member], _reference: DateTime<Utc>) -> Vec<f64> {
        self.values.clone()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Built-in metrics, addressed by short name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    LastLoginInterval,
}

impl MetricKind {
    /// The metric implementation behind this kind.
    pub fn source(self) -> Box<dyn MetricSource> {
        match self {
            MetricKind::LastLoginInterval => Box::new(LastLoginInterval),
        }
    }
}

/// Registered metric and its bookkeeping flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub shortname: String,
    #[serde(default)]
    pub longname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether historical periods should be backfilled.
    #[serde(default)]
    pub get_history: bool,
}

fn default_enabled() -> bool {
    true
}

impl MetricDefinition {
    /// Resolves the short name to a built-in metric.
    pub fn kind(&self) -> Result<MetricKind, NlaError> {
        self.shortname
            .parse()
            .map_err(|_| NlaError::UnknownMetric(self.shortname.clone()))
    }
}

/// Metrics registered on a fresh installation.
pub fn default_metrics() -> Vec<MetricDefinition> {
    vec![MetricDefinition {
        shortname: MetricKind::LastLoginInterval.to_string(),
        longname: "Last Login Interval".to_string(),
        description: "Time since the user last logged into the system".to_string(),
        enabled: true,
        get_history: false,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use strum::IntoEnumIterator;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_last_login_interval_skips_inactive() {
        let now = at(1_509_584_382);
        let members = [
            Member {
                id: 1,
                last_activity: None,
            },
            Member {
                id: 2,
                last_activity: Some(at(1_509_584_381)),
            },
        ];
        let values = LastLoginInterval.to_numeric_sequence(&members, now);
        assert_eq!(values, vec![1.0]);
    }

    #[test]
    fn test_last_login_interval_keeps_member_order() {
        let now = at(1_000_000);
        let members = [
            Member {
                id: 5,
                last_activity: Some(now - Duration::days(1)),
            },
            Member {
                id: 3,
                last_activity: Some(now - Duration::hours(1)),
            },
        ];
        assert_eq!(
            LastLoginInterval.to_numeric_sequence(&members, now),
            vec![86_400.0, 3_600.0]
        );
    }

    #[test]
    fn test_last_login_interval_no_members() {
        assert!(LastLoginInterval
            .to_numeric_sequence(&[], at(0))
            .is_empty());
    }

    #[test]
    fn test_static_metric_ignores_members() {
        let metric = StaticMetric::new([1.0, 2.0, 3.0, 4.0, 5.0]);
        let values = metric.to_numeric_sequence(&[], at(0));
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        // restartable: a second call yields the same sequence
        assert_eq!(metric.to_numeric_sequence(&[], at(0)), values);
    }

    #[test]
    fn test_kind_round_trips_shortname() {
        assert_eq!(MetricKind::LastLoginInterval.as_ref(), "last_login_interval");
        assert_eq!(
            "last_login_interval".parse::<MetricKind>().unwrap(),
            MetricKind::LastLoginInterval
        );
        assert!("forum_posts".parse::<MetricKind>().is_err());
        assert_eq!(MetricKind::iter().count(), 1);
    }

    #[test]
    fn test_default_metrics() {
        let metrics = default_metrics();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].shortname, "last_login_interval");
        assert_eq!(metrics[0].longname, "Last Login Interval");
        assert!(metrics[0].enabled);
        assert!(!metrics[0].get_history);
        assert_eq!(metrics[0].kind().unwrap(), MetricKind::LastLoginInterval);
    }

    #[test]
    fn test_unknown_metric_definition() {
        let def = MetricDefinition {
            shortname: "forum_posts".into(),
            longname: String::new(),
            description: String::new(),
            enabled: true,
            get_history: false,
        };
        assert!(matches!(def.kind(), Err(NlaError::UnknownMetric(name)) if name == "forum_posts"));
    }

    #[test]
    fn test_definition_defaults_from_toml() {
        let def: MetricDefinition = toml::from_str(r#"shortname = "last_login_interval""#).unwrap();
        assert!(def.enabled);
        assert!(!def.get_history);
        assert!(def.longname.is_empty());
    }
}
