//! Write-only storage for computed statistics.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::GroupId;
use crate::error::SinkError;
use crate::stats::StatsResult;

/// Statistics of one metric for one group over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub metric: String,
    pub group_id: GroupId,
    pub period_start: DateTime<Utc>,
    pub period_length_secs: i64,
    #[serde(flatten)]
    pub stats: StatsResult,
}

/// Destination for [`StatsRecord`]s.
#[cfg_attr(test, mockall::automock)]
pub trait ResultSink {
    fn persist(&mut self, record: StatsRecord) -> Result<(), SinkError>;
}

/// Sink that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<StatsRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StatsRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StatsRecord> {
        self.records
    }
}

impl ResultSink for MemorySink {
    fn persist(&mut self, record: StatsRecord) -> Result<(), SinkError> {
        self.records.push(record);
        Ok(())
    }
}

/// Sink writing one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn persist(&mut self, record: StatsRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
