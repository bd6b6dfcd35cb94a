//! Analysis runs: metrics × groups → statistics → sink.
//!
//! The [`Analyzer`] owns the three collaborators and the configuration. A
//! [`run`](Analyzer::run) visits every enabled metric for every analyzable
//! group, skips pairs the [`ScheduleGate`] says are not due, and persists one
//! [`StatsRecord`] per pair that produced observations.

use chrono::{DateTime, Utc};

use crate::config::NlaConfig;
use crate::entities::{EntitySource, GroupId};
use crate::error::{NlaError, NlaResult};
use crate::metrics::{MetricDefinition, MetricKind, MetricSource};
use crate::schedule::ScheduleGate;
use crate::sink::{ResultSink, StatsRecord};
use crate::stats::{compute_stats, StatsResult};

/// Outcome counts of one [`Analyzer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pairs whose statistics were persisted.
    pub processed: usize,
    /// Pairs not yet due.
    pub skipped: usize,
    /// Pairs that produced no observations.
    pub empty: usize,
    /// Pairs that failed in a collaborator.
    pub failed: usize,
}

/// Runs metrics over groups and persists their statistics.
///
/// `E` supplies groups and members, `G` throttles recomputation and `S`
/// receives the results.
pub struct Analyzer<E, G, S> {
    config: NlaConfig,
    entities: E,
    gate: G,
    sink: S,
}

impl<E, G, S> Analyzer<E, G, S>
where
    E: EntitySource,
    G: ScheduleGate,
    S: ResultSink,
{
    /// Wires an analyzer from its configuration and collaborators.
    ///
    /// The schedule interval is checked when it is used, so a config that
    /// skipped [`NlaConfig::validate`] fails with an error rather than a panic.
    pub fn new(config: NlaConfig, entities: E, gate: G, sink: S) -> Self {
        Self {
            config,
            entities,
            gate,
            sink,
        }
    }

    /// The configuration this analyzer runs with.
    pub fn config(&self) -> &NlaConfig {
        &self.config
    }

    /// The result sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The schedule gate.
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Consumes the analyzer, handing back its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Enabled metric definitions.
    pub fn metrics(&self) -> Vec<&MetricDefinition> {
        self.config.enabled_metrics().collect()
    }

    /// Computes and persists `kind` for `group`.
    ///
    /// Returns `Ok(None)` without persisting anything when the group yields
    /// no observations.
    pub fn process_metric(
        &mut self,
        kind: MetricKind,
        group: GroupId,
        now: DateTime<Utc>,
    ) -> NlaResult<Option<StatsResult>> {
        self.process_with(kind.as_ref(), kind.source().as_ref(), group, now)
    }

    /// Like [`process_metric`](Self::process_metric) for an arbitrary metric
    /// implementation stored under `name`.
    pub fn process_with(
        &mut self,
        name: &str,
        metric: &dyn MetricSource,
        group: GroupId,
        now: DateTime<Utc>,
    ) -> NlaResult<Option<StatsResult>> {
        let members = self.entities.list_members(group, now)?;
        let values = metric.to_numeric_sequence(&members, now);
        if values.is_empty() {
            log::debug!(
                "metric {name}: group {group} has no observations among {} member(s)",
                members.len()
            );
            return Ok(None);
        }

        let stats = compute_stats(&values);
        let interval = self.config.schedule.interval()?;
        let period_start = now
            .checked_sub_signed(interval)
            .ok_or_else(|| NlaError::PeriodOutOfRange {
                end: now,
                interval_secs: interval.num_seconds(),
            })?;
        self.sink.persist(StatsRecord {
            metric: name.to_string(),
            group_id: group,
            period_start,
            period_length_secs: interval.num_seconds(),
            stats,
        })?;
        log::debug!(
            "metric {name}: group {group} n={} median={} iqr={}",
            values.len(),
            stats.median,
            stats.interquartile_range
        );
        Ok(Some(stats))
    }

    /// Processes every due (metric, group) pair.
    ///
    /// Failing to list groups or resolve a metric aborts the run; a failure
    /// for a single group is logged, counted and the run continues.
    pub fn run(&mut self, now: DateTime<Utc>) -> NlaResult<RunSummary> {
        let kinds = self
            .config
            .enabled_metrics()
            .map(MetricDefinition::kind)
            .collect::<Result<Vec<_>, NlaError>>()?;
        let interval = self.config.schedule.interval()?;
        let groups = self.entities.list_analyzable_groups(now)?;
        log::info!(
            "analysis run: {} metric(s) over {} group(s)",
            kinds.len(),
            groups.len()
        );

        let mut summary = RunSummary::default();
        for kind in kinds {
            let name = kind.as_ref();
            for &group in &groups {
                if !self.gate.is_due(name, group, interval, now) {
                    summary.skipped += 1;
                    continue;
                }
                match self.process_metric(kind, group, now) {
                    Ok(Some(_)) => {
                        summary.processed += 1;
                        self.gate.record_run(name, group, now);
                    }
                    Ok(None) => {
                        summary.empty += 1;
                        self.gate.record_run(name, group, now);
                    }
                    Err(e) => {
                        log::warn!("metric {name}: group {group} failed: {e}");
                        summary.failed += 1;
                    }
                }
            }
        }

        log::info!("analysis run finished: {summary:?}");
        Ok(summary)
    }
}
