//! Analyzer configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to the values
//! a fresh installation would use:
//!
//! ```toml
//! [inclusion]
//! exclude_hidden_groups = true
//! respect_active_window = true
//!
//! [schedule]
//! interval_secs = 604800
//!
//! [[metrics]]
//! shortname = "last_login_interval"
//! longname = "Last Login Interval"
//! enabled = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::entities::InclusionPolicy;
use crate::error::ConfigError;
use crate::metrics::{default_metrics, MetricDefinition};
use crate::schedule::DEFAULT_INTERVAL_SECS;

/// Longest accepted recomputation interval: one hundred years.
pub const MAX_INTERVAL_SECS: i64 = 100 * 366 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minimum time between two runs of a metric for the same group.
    pub interval_secs: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl ScheduleConfig {
    /// The interval as a [`Duration`].
    ///
    /// Fails unless `interval_secs` lies in `1..=MAX_INTERVAL_SECS`.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        if !(1..=MAX_INTERVAL_SECS).contains(&self.interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "schedule.interval_secs must be in 1..={MAX_INTERVAL_SECS}, got {}",
                self.interval_secs
            )));
        }
        Duration::try_seconds(self.interval_secs).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "schedule.interval_secs {} is out of range",
                self.interval_secs
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlaConfig {
    pub inclusion: InclusionPolicy,
    pub schedule: ScheduleConfig,
    pub metrics: Vec<MetricDefinition>,
}

impl Default for NlaConfig {
    fn default() -> Self {
        Self {
            inclusion: InclusionPolicy::default(),
            schedule: ScheduleConfig::default(),
            metrics: default_metrics(),
        }
    }
}

impl NlaConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: NlaConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "loaded config from {}: {} metric(s), interval {}s",
            path.display(),
            config.metrics.len(),
            config.schedule.interval_secs
        );
        Ok(config)
    }

    /// Checks constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.interval()?;

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if metric.shortname.trim().is_empty() {
                return Err(ConfigError::Invalid("metric shortname must not be empty".into()));
            }
            if !seen.insert(metric.shortname.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate metric '{}'",
                    metric.shortname
                )));
            }
        }
        Ok(())
    }

    /// Enabled metric definitions, in declaration order.
    pub fn enabled_metrics(&self) -> impl Iterator<Item = &MetricDefinition> + '_ {
        self.metrics.iter().filter(|m| m.enabled)
    }
}
