//! Error types for configuration and the analysis collaborators.
//!
//! The statistics engine itself has no failure modes; everything here
//! belongs to loading configuration, reading entities and writing results.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entities::GroupId;

/// Failure to load or validate an [`NlaConfig`](crate::config::NlaConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure reported by an [`EntitySource`](crate::entities::EntitySource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),

    #[error("entity source unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a [`ResultSink`](crate::sink::ResultSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write stats record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode stats record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Umbrella error of the analysis pipeline.
#[derive(Debug, Error)]
pub enum NlaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("period of {interval_secs}s ending at {end} starts before the earliest representable time")]
    PeriodOutOfRange {
        end: DateTime<Utc>,
        interval_secs: i64,
    },
}

pub type NlaResult<T> = Result<T, NlaError>;
