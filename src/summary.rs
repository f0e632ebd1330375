//! Bounded data summary for the assistant and the report header.
//!
//! The summary carries aggregate counts and rates only. Record identifiers,
//! free text and dates never leave this module.

use crate::analysis::{mean_stalled_days, round1, GroupKey};
use crate::models::{Record, SlaStatus};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Maximum entries kept per breakdown.
pub const MAX_BREAKDOWN_ENTRIES: usize = 15;

/// Count, SLA rate and mean stalled days for a population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub total: usize,
    /// Percentage within SLA; `None` for an empty population.
    pub sla_percentage: Option<f64>,
    pub average_stalled_days: f64,
}

impl PerformanceMetric {
    pub fn from_records<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r Record>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        let total = records.clone().count();
        if total == 0 {
            return Self {
                total: 0,
                sla_percentage: None,
                average_stalled_days: 0.0,
            };
        }

        let within = records
            .clone()
            .filter(|r| r.sla_status == SlaStatus::WithinSLA)
            .count();

        Self {
            total,
            sla_percentage: Some(round1(within as f64 / total as f64 * 100.0)),
            average_stalled_days: round1(mean_stalled_days(records)),
        }
    }

    /// SLA percentage as display text (`N/A` when undefined).
    pub fn sla_label(&self) -> String {
        match self.sla_percentage {
            Some(pct) => format!("{:.1}%", pct),
            None => "N/A".to_string(),
        }
    }
}

/// One row of a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    #[serde(flatten)]
    pub metrics: PerformanceMetric,
}

/// Bounded summary of a processed dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub overall: PerformanceMetric,
    pub by_analyst: Vec<SummaryEntry>,
    pub by_executor: Vec<SummaryEntry>,
    pub by_group: Vec<SummaryEntry>,
}

/// Group, compute metrics, keep the top entries by count.
fn breakdown(records: &[Record], key: GroupKey) -> Vec<SummaryEntry> {
    let grouped = records
        .iter()
        .fold(BTreeMap::<&str, Vec<&Record>>::new(), |mut acc, record| {
            acc.entry(key.of(record)).or_default().push(record);
            acc
        });

    let mut entries: Vec<SummaryEntry> = grouped
        .into_iter()
        .map(|(name, members)| SummaryEntry {
            name: name.to_string(),
            metrics: PerformanceMetric::from_records(members.iter().copied()),
        })
        .collect();

    entries.sort_by_key(|entry| Reverse(entry.metrics.total));
    entries.truncate(MAX_BREAKDOWN_ENTRIES);
    entries
}

impl DataSummary {
    /// Summarize the canonical record set.
    pub fn build(records: &[Record]) -> Self {
        Self {
            overall: PerformanceMetric::from_records(records),
            by_analyst: breakdown(records, GroupKey::Analyst),
            by_executor: breakdown(records, GroupKey::Executor),
            by_group: breakdown(records, GroupKey::Group),
        }
    }

    /// Render the prompt sent to the assistant.
    pub fn to_prompt(&self, question: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You are an expert analyst of service-order (OS) backlogs and team performance.\n",
        );
        prompt.push_str(
            "Analyze the backlog summary below and answer the user's question.\n\n",
        );

        prompt.push_str("Context:\n");
        prompt.push_str("- Responsible analyst: the back-office analyst who supervises the order, assigned by business rules.\n");
        prompt.push_str("- Executor: the technician or team performing the work.\n");
        prompt.push_str("- Stalled days: measured in business days. High values mean slow progress.\n");
        prompt.push_str("- % within SLA: share of orders meeting their deadline. Above 70% is good.\n\n");

        prompt.push_str("Backlog summary:\n");
        prompt.push_str(&format!("- Total orders: {}\n", self.overall.total));
        prompt.push_str(&format!(
            "- % within SLA (overall): {}\n",
            self.overall.sla_label()
        ));
        prompt.push_str(&format!(
            "- Average stalled days (overall): {:.1}\n\n",
            self.overall.average_stalled_days
        ));

        prompt.push_str(&format_breakdown("Performance by analyst", &self.by_analyst));
        prompt.push_str(&format_breakdown("Performance by executor", &self.by_executor));
        prompt.push_str(&format_breakdown("Performance by group", &self.by_group));

        prompt.push_str(&format!("User question:\n\"{}\"\n\n", question.trim()));
        prompt.push_str("Your analysis (bullet points, direct and objective language):");

        prompt
    }
}

fn format_breakdown(title: &str, entries: &[SummaryEntry]) -> String {
    if entries.is_empty() {
        return format!("{}: no data available.\n\n", title);
    }

    let mut section = format!("{}:\n", title);
    for entry in entries {
        section.push_str(&format!(
            "- {} | OS: {} | SLA: {} | Avg days: {:.1}\n",
            entry.name,
            entry.metrics.total,
            entry.metrics.sla_label(),
            entry.metrics.average_stalled_days
        ));
    }
    section.push('\n');
    section
}
