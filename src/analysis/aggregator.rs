//! Record aggregation and statistics.
//!
//! This module folds record collections into per-key performance tables
//! (count, total/max/average stalled days) and SLA splits. Each call builds
//! a fresh map; nothing is shared between calls.

use crate::models::{Record, SlaStatus};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Field used as the grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Group,
    Executor,
    Analyst,
}

impl GroupKey {
    /// Key value for a record; missing values use the unassigned sentinel.
    pub fn of<'r>(&self, record: &'r Record) -> &'r str {
        match self {
            GroupKey::Group => record.group_key(),
            GroupKey::Executor => record.executor_key(),
            GroupKey::Analyst => &record.assigned_analyst,
        }
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-key stalled-day statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub key: String,
    pub count: usize,
    pub total_stalled_days: u64,
    pub max_stalled_days: u32,
    /// `total / count`, rounded to one decimal.
    pub average_stalled_days: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    count: usize,
    total: u64,
    max: u32,
}

impl Tally {
    fn record(self, stalled_days: u32) -> Self {
        Self {
            count: self.count + 1,
            total: self.total + u64::from(stalled_days),
            max: self.max.max(stalled_days),
        }
    }
}

/// Fold records into an immutable key → aggregate map.
pub fn aggregate_by<'r, I>(records: I, key: GroupKey) -> BTreeMap<String, GroupAggregate>
where
    I: IntoIterator<Item = &'r Record>,
{
    let tallies = records
        .into_iter()
        .fold(BTreeMap::<String, Tally>::new(), |mut acc, record| {
            let entry = acc.entry(key.of(record).to_string()).or_default();
            *entry = entry.record(record.stalled_days);
            acc
        });

    tallies
        .into_iter()
        .map(|(key, tally)| {
            let aggregate = GroupAggregate {
                key: key.clone(),
                count: tally.count,
                total_stalled_days: tally.total,
                max_stalled_days: tally.max,
                average_stalled_days: round1(tally.total as f64 / tally.count as f64),
            };
            (key, aggregate)
        })
        .collect()
}

/// Performance table sorted by descending average stalled days.
pub fn performance_by<'r, I>(records: I, key: GroupKey) -> Vec<GroupAggregate>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut rows: Vec<GroupAggregate> = aggregate_by(records, key).into_values().collect();
    rows.sort_by(|a, b| b.average_stalled_days.total_cmp(&a.average_stalled_days));
    rows
}

/// Breakdown table sorted by descending record count.
pub fn breakdown_by<'r, I>(records: I, key: GroupKey) -> Vec<GroupAggregate>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut rows: Vec<GroupAggregate> = aggregate_by(records, key).into_values().collect();
    rows.sort_by_key(|row| Reverse(row.count));
    rows
}

/// Within/outside SLA split for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlaSplit {
    pub group: String,
    pub within_sla: usize,
    pub outside_sla: usize,
    pub total: usize,
}

/// SLA split per group, sorted by descending total.
pub fn sla_by_group<'r, I>(records: I) -> Vec<SlaSplit>
where
    I: IntoIterator<Item = &'r Record>,
{
    let splits = records
        .into_iter()
        .fold(BTreeMap::<&str, SlaSplit>::new(), |mut acc, record| {
            let split = acc.entry(record.group_key()).or_insert_with(|| SlaSplit {
                group: record.group_key().to_string(),
                ..SlaSplit::default()
            });
            match record.sla_status {
                SlaStatus::WithinSLA => split.within_sla += 1,
                SlaStatus::OutsideSLA => split.outside_sla += 1,
            }
            split.total += 1;
            acc
        });

    let mut rows: Vec<SlaSplit> = splits.into_values().collect();
    rows.sort_by_key(|row| Reverse(row.total));
    rows
}

/// A named count, used for chart-style distributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub name: String,
    pub value: usize,
}

/// Count records per label, sorted by descending count.
pub fn distribution<'r, I, F>(records: I, label: F) -> Vec<Distribution>
where
    I: IntoIterator<Item = &'r Record>,
    F: Fn(&'r Record) -> String,
{
    let counts = records
        .into_iter()
        .fold(BTreeMap::<String, usize>::new(), |mut acc, record| {
            *acc.entry(label(record)).or_default() += 1;
            acc
        });

    let mut rows: Vec<Distribution> = counts
        .into_iter()
        .map(|(name, value)| Distribution { name, value })
        .collect();
    rows.sort_by_key(|row| Reverse(row.value));
    rows
}

/// Mean stalled days (unrounded); zero for an empty collection.
pub fn mean_stalled_days<'r, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'r Record>,
{
    let (count, total) = records
        .into_iter()
        .fold((0usize, 0u64), |(count, total), record| {
            (count + 1, total + u64::from(record.stalled_days))
        });

    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
