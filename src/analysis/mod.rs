//! Analysis modules.
//!
//! [`analyze`] turns a classification run into every table the report
//! shows: offender buckets, performance tables, distributions, headline
//! metrics, and the logistics sub-report.

pub mod aggregator;
pub mod logistics;
pub mod metrics;

pub use aggregator::*;
pub use logistics::{analyze_logistics, LogisticsReport};
pub use metrics::{headline_metrics, Level, Metric};

use crate::config::Config;
use crate::models::Record;
use crate::offenders::OffenderBuckets;
use crate::pipeline::Classification;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

/// Label for records without a status.
const NO_STATUS: &str = "Undefined";

/// Everything derived from one classification run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis<'a> {
    pub now: NaiveDateTime,
    pub rows_read: usize,
    /// Canonical record set.
    pub records: &'a [Record],
    pub offenders: OffenderBuckets<'a>,
    pub metrics: Vec<Metric>,
    pub executor_performance: Vec<GroupAggregate>,
    pub analyst_performance: Vec<GroupAggregate>,
    pub group_breakdown: Vec<GroupAggregate>,
    pub sla_by_group: Vec<SlaSplit>,
    pub sla_distribution: Vec<Distribution>,
    pub status_distribution: Vec<Distribution>,
    pub analyst_distribution: Vec<Distribution>,
    pub logistics: LogisticsReport<'a>,
}

impl Analysis<'_> {
    /// True when any headline metric is critical.
    pub fn has_critical_metric(&self) -> bool {
        self.metrics.iter().any(|m| m.level == Level::Critical)
    }
}

/// Run every aggregation over a classification result.
pub fn analyze<'a>(classification: &'a Classification, config: &Config) -> Analysis<'a> {
    let records = classification.records.as_slice();
    let now = classification.now;

    let offenders = OffenderBuckets::extract(records, &config.filters, now);
    let metrics = headline_metrics(
        records.len(),
        mean_stalled_days(records),
        &offenders,
        &config.thresholds,
    );

    debug!(
        "Offenders: {} pending, {} late field work, {} overdue scheduled, {} incorrectly closed",
        offenders.pending_scheduling.len(),
        offenders.late_field_work.len(),
        offenders.overdue_scheduled.len(),
        offenders.incorrectly_closed.len()
    );

    Analysis {
        now,
        rows_read: classification.unfiltered.len(),
        records,
        metrics,
        executor_performance: performance_by(records, GroupKey::Executor),
        analyst_performance: performance_by(records, GroupKey::Analyst),
        group_breakdown: breakdown_by(records, GroupKey::Group),
        sla_by_group: sla_by_group(records),
        sla_distribution: distribution(records, |r| r.sla_status.to_string()),
        status_distribution: distribution(records, |r| {
            r.status.clone().unwrap_or_else(|| NO_STATUS.to_string())
        }),
        analyst_distribution: distribution(records, |r| r.assigned_analyst.clone()),
        logistics: analyze_logistics(
            &classification.unfiltered,
            &config.filters.logistics_groups,
            now,
        ),
        offenders,
    }
}
