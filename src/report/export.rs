//! CSV export of the record set, offender buckets and performance tables.

use crate::analysis::{Analysis, GroupAggregate};
use crate::models::Record;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flat CSV row for one record. Raw timestamps are exported as text.
#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    os: &'a str,
    group: &'a str,
    executor: &'a str,
    status: &'a str,
    called_at: String,
    entered_at: String,
    scheduled_at: String,
    deadline: &'a str,
    stalled_days: u32,
    sla_status: String,
    technical_responsible: &'a str,
    partner: &'a str,
    economic_group: &'a str,
    financial_project: &'a str,
    assigned_analyst: &'a str,
}

impl<'a> From<&'a Record> for RecordRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            os: &record.id,
            group: record.group_key(),
            executor: record.executor_key(),
            status: record.status_str(),
            called_at: record.called_at.to_text().unwrap_or_default(),
            entered_at: record.entered_at.to_text().unwrap_or_default(),
            scheduled_at: record.scheduled_at.to_text().unwrap_or_default(),
            deadline: &record.deadline,
            stalled_days: record.stalled_days,
            sla_status: record.sla_status.to_string(),
            technical_responsible: record.technical_responsible.as_deref().unwrap_or_default(),
            partner: record.partner.as_deref().unwrap_or_default(),
            economic_group: record.economic_group.as_deref().unwrap_or_default(),
            financial_project: record.financial_project.as_deref().unwrap_or_default(),
            assigned_analyst: &record.assigned_analyst,
        }
    }
}

/// Column names of [`RecordRow`], in field order.
const RECORD_HEADERS: [&str; 15] = [
    "os",
    "group",
    "executor",
    "status",
    "called_at",
    "entered_at",
    "scheduled_at",
    "deadline",
    "stalled_days",
    "sla_status",
    "technical_responsible",
    "partner",
    "economic_group",
    "financial_project",
    "assigned_analyst",
];

/// Column names of [`GroupAggregate`], in field order.
const PERFORMANCE_HEADERS: [&str; 5] = [
    "key",
    "count",
    "total_stalled_days",
    "max_stalled_days",
    "average_stalled_days",
];

/// Write a header line, then one line per row. Empty tables keep the header.
fn write_rows<T, I>(path: &Path, headers: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer
        .write_record(headers)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

fn write_records<'r, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'r Record>,
{
    write_rows(path, &RECORD_HEADERS, records.into_iter().map(RecordRow::from))
}

fn write_performance(path: &Path, rows: &[GroupAggregate]) -> Result<()> {
    write_rows(path, &PERFORMANCE_HEADERS, rows)
}

/// Write the analysis tables as CSV files into `dir`.
///
/// Produces `records.csv`, one `<bucket>.csv` per offender bucket and the
/// executor/analyst performance tables. Returns the written paths.
pub fn export_csv(analysis: &Analysis<'_>, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut written = Vec::new();

    let path = dir.join("records.csv");
    write_records(&path, analysis.records)?;
    written.push(path);

    for (kind, records) in analysis.offenders.iter() {
        let path = dir.join(format!("{}.csv", kind.slug()));
        write_records(&path, records.iter().copied())?;
        written.push(path);
    }

    let path = dir.join("executor_performance.csv");
    write_performance(&path, &analysis.executor_performance)?;
    written.push(path);

    let path = dir.join("analyst_performance.csv");
    write_performance(&path, &analysis.analyst_performance)?;
    written.push(path);

    debug!("Exported {} CSV files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::Config;
    use crate::models::columns;
    use crate::pipeline::tests::{fixed_now, row};
    use crate::pipeline::Pipeline;

    #[test]
    fn test_export_csv() {
        let config = Config::default();
        let rows = vec![
            row(&[
                (columns::ID, "1001"),
                (columns::GROUP, "FIELD"),
                (columns::EXECUTOR, "Tech A"),
                (columns::STATUS, "ABERTO"),
                (columns::ENTERED_AT, "15/01/2024"),
                (columns::TECHNICAL_RESPONSIBLE, "VAGNER"),
            ]),
            row(&[(columns::ID, "1002"), (columns::GROUP, "CO")]),
        ];
        let classification = Pipeline::from_config(&config).run(&rows, fixed_now());
        let analysis = analyze(&classification, &config);

        let dir = tempfile::tempdir().unwrap();
        let written = export_csv(&analysis, dir.path()).unwrap();

        // records + six buckets + two performance tables
        assert_eq!(written.len(), 9);
        assert!(written.iter().all(|p| p.exists()));

        let records = std::fs::read_to_string(dir.path().join("records.csv")).unwrap();
        let mut lines = records.lines();
        assert!(lines.next().unwrap().starts_with("os,group,executor,status"));
        assert_eq!(records.lines().count(), 3);
        assert!(records.contains("1001,FIELD,Tech A,ABERTO"));
        assert!(records.contains("Marilia Rosane"));

        let late = std::fs::read_to_string(dir.path().join("late_field_work.csv")).unwrap();
        assert!(late.contains("1001"));
        assert!(!late.contains("1002"));

        let perf = std::fs::read_to_string(dir.path().join("executor_performance.csv")).unwrap();
        assert!(perf.starts_with("key,count,total_stalled_days,max_stalled_days,average_stalled_days"));
        assert!(perf.contains("Tech A,1,5,5,5.0"));
    }

    #[test]
    fn test_export_creates_directory() {
        let config = Config::default();
        let classification = Pipeline::from_config(&config).run(&[], fixed_now());
        let analysis = analyze(&classification, &config);

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("csv");
        let written = export_csv(&analysis, &nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(written.len(), 9);

        // Empty tables still carry their header line.
        let records = std::fs::read_to_string(nested.join("records.csv")).unwrap();
        assert_eq!(records, format!("{}\n", RECORD_HEADERS.join(",")));
        let bucket = std::fs::read_to_string(nested.join("overdue_scheduled.csv")).unwrap();
        assert!(bucket.starts_with("os,group,executor,status"));
        let perf = std::fs::read_to_string(nested.join("analyst_performance.csv")).unwrap();
        assert_eq!(perf, format!("{}\n", PERFORMANCE_HEADERS.join(",")));
    }
}
