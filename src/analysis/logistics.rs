//! Logistics sub-report.
//!
//! Computed over the unfiltered record set, restricted to the logistics
//! groups. Group names are compared upper-cased.

use crate::models::{Record, SlaStatus};
use crate::offenders::is_overdue_scheduled;
use chrono::NaiveDateTime;
use serde::Serialize;

use super::aggregator::{mean_stalled_days, performance_by, GroupAggregate, GroupKey};

/// Items stalled longer than this are flagged as suspicious.
pub const SUSPICIOUS_STALLED_DAYS: u32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct LogisticsReport<'a> {
    pub total_items: usize,
    pub within_sla: usize,
    pub outside_sla: usize,
    pub overdue_scheduled: usize,
    /// Unrounded mean stalled days.
    pub average_stalled_days: f64,
    pub items: Vec<&'a Record>,
    pub overdue_scheduled_items: Vec<&'a Record>,
    pub sla_breached_items: Vec<&'a Record>,
    pub suspicious_items: Vec<&'a Record>,
    pub by_executor: Vec<GroupAggregate>,
}

fn is_logistics(record: &Record, groups: &[String]) -> bool {
    record
        .group
        .as_ref()
        .is_some_and(|group| groups.contains(&group.to_uppercase()))
}

/// Build the logistics sub-report.
pub fn analyze_logistics<'a>(
    unfiltered: &'a [Record],
    groups: &[String],
    now: NaiveDateTime,
) -> LogisticsReport<'a> {
    let items: Vec<&'a Record> = unfiltered
        .iter()
        .filter(|r| is_logistics(r, groups))
        .collect();

    let within_sla = items
        .iter()
        .filter(|r| r.sla_status == SlaStatus::WithinSLA)
        .count();

    let overdue_scheduled_items: Vec<&'a Record> = items
        .iter()
        .copied()
        .filter(|r| is_overdue_scheduled(r, now))
        .collect();

    let sla_breached_items: Vec<&'a Record> = items
        .iter()
        .copied()
        .filter(|r| r.sla_status == SlaStatus::OutsideSLA)
        .collect();

    let suspicious_items: Vec<&'a Record> = items
        .iter()
        .copied()
        .filter(|r| r.stalled_days > SUSPICIOUS_STALLED_DAYS)
        .collect();

    LogisticsReport {
        total_items: items.len(),
        within_sla,
        outside_sla: items.len() - within_sla,
        overdue_scheduled: overdue_scheduled_items.len(),
        average_stalled_days: mean_stalled_days(items.iter().copied()),
        by_executor: performance_by(items.iter().copied(), GroupKey::Executor),
        items,
        overdue_scheduled_items,
        sla_breached_items,
        suspicious_items,
    }
}
