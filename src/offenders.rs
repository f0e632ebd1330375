//! Offender buckets.
//!
//! Each bucket is a named, predicate-defined view over the canonical record
//! set. Buckets borrow the records and may overlap.

use crate::config::FiltersConfig;
use crate::models::Record;
use crate::normalize::parse_date;
use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static PENDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PENDENTE|PENDENTE DE AGENDAMENTO").expect("static pattern"));

static PENDING_SCHEDULING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PENDENTE DE AGENDAMENTO").expect("static pattern"));

static INTERNAL_PENDENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^PENDENTE$").expect("static pattern"));

static SCHEDULED_OR_PENDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)AGENDADO|PENDENTE DE AGENDAMENTO").expect("static pattern"));

static CLOSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RESOLVIDO|FECHADO|ENCERRADO|CONCLUÍDO|CONCLUIDO|FINALIZADO")
        .expect("static pattern")
});

/// Minimum stalled days before field work counts as late.
pub const LATE_FIELD_WORK_DAYS: u32 = 3;

/// Names of the offender buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    PendingScheduling,
    PendingSchedulingSegmented,
    InternalPendency,
    LateFieldWork,
    OverdueScheduled,
    IncorrectlyClosed,
}

impl BucketKind {
    pub const ALL: [BucketKind; 6] = [
        BucketKind::PendingScheduling,
        BucketKind::PendingSchedulingSegmented,
        BucketKind::InternalPendency,
        BucketKind::LateFieldWork,
        BucketKind::OverdueScheduled,
        BucketKind::IncorrectlyClosed,
    ];

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            BucketKind::PendingScheduling => "Pending (> 0 days)",
            BucketKind::PendingSchedulingSegmented => "Pending Scheduling",
            BucketKind::InternalPendency => "Internal Pendencies",
            BucketKind::LateFieldWork => "Late Field Work",
            BucketKind::OverdueScheduled => "Overdue Scheduled",
            BucketKind::IncorrectlyClosed => "Incorrectly Closed",
        }
    }

    /// File-name friendly slug.
    pub fn slug(&self) -> &'static str {
        match self {
            BucketKind::PendingScheduling => "pending_scheduling",
            BucketKind::PendingSchedulingSegmented => "pending_scheduling_segmented",
            BucketKind::InternalPendency => "internal_pendency",
            BucketKind::LateFieldWork => "late_field_work",
            BucketKind::OverdueScheduled => "overdue_scheduled",
            BucketKind::IncorrectlyClosed => "incorrectly_closed",
        }
    }
}

/// Status contains `PENDENTE` and the order is stalled.
pub fn is_pending(record: &Record) -> bool {
    PENDING.is_match(record.status_str()) && record.stalled_days > 0
}

/// Status contains `PENDENTE DE AGENDAMENTO` and the order is stalled.
pub fn is_pending_scheduling(record: &Record) -> bool {
    PENDING_SCHEDULING.is_match(record.status_str()) && record.stalled_days > 0
}

/// Status is exactly `PENDENTE` and the order is stalled.
pub fn is_internal_pendency(record: &Record) -> bool {
    INTERNAL_PENDENCY.is_match(record.status_str()) && record.stalled_days > 0
}

/// Field-team order stalled three or more days without a visit scheduled.
pub fn is_late_field_work(record: &Record, field_groups: &[String]) -> bool {
    let in_field = record
        .group
        .as_ref()
        .is_some_and(|group| field_groups.contains(group));

    in_field
        && record.stalled_days >= LATE_FIELD_WORK_DAYS
        && !SCHEDULED_OR_PENDING.is_match(record.status_str())
}

/// Status is exactly `AGENDADO` and the scheduled date is already past.
pub fn is_overdue_scheduled(record: &Record, now: NaiveDateTime) -> bool {
    if !record.status_str().eq_ignore_ascii_case("AGENDADO") {
        return false;
    }
    parse_date(&record.scheduled_at)
        .is_some_and(|scheduled| scheduled.and_time(NaiveTime::default()) < now)
}

/// Status says the order is finished, yet it sits in the open backlog.
pub fn is_incorrectly_closed(record: &Record) -> bool {
    CLOSED.is_match(record.status_str())
}

fn select<'a>(records: &'a [Record], predicate: impl Fn(&Record) -> bool) -> Vec<&'a Record> {
    records.iter().filter(|r| predicate(r)).collect()
}

/// All offender buckets for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OffenderBuckets<'a> {
    pub pending_scheduling: Vec<&'a Record>,
    pub pending_scheduling_segmented: Vec<&'a Record>,
    pub internal_pendency: Vec<&'a Record>,
    pub late_field_work: Vec<&'a Record>,
    pub overdue_scheduled: Vec<&'a Record>,
    pub incorrectly_closed: Vec<&'a Record>,
}

impl<'a> OffenderBuckets<'a> {
    /// Extract every bucket from the canonical set.
    pub fn extract(records: &'a [Record], filters: &FiltersConfig, now: NaiveDateTime) -> Self {
        Self {
            pending_scheduling: select(records, is_pending),
            pending_scheduling_segmented: select(records, is_pending_scheduling),
            internal_pendency: select(records, is_internal_pendency),
            late_field_work: select(records, |r| is_late_field_work(r, &filters.field_groups)),
            overdue_scheduled: select(records, |r| is_overdue_scheduled(r, now)),
            incorrectly_closed: select(records, is_incorrectly_closed),
        }
    }

    pub fn get(&self, kind: BucketKind) -> &[&'a Record] {
        match kind {
            BucketKind::PendingScheduling => &self.pending_scheduling,
            BucketKind::PendingSchedulingSegmented => &self.pending_scheduling_segmented,
            BucketKind::InternalPendency => &self.internal_pendency,
            BucketKind::LateFieldWork => &self.late_field_work,
            BucketKind::OverdueScheduled => &self.overdue_scheduled,
            BucketKind::IncorrectlyClosed => &self.incorrectly_closed,
        }
    }

    /// Bucket kinds with their members, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKind, &[&'a Record])> + '_ {
        BucketKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}
