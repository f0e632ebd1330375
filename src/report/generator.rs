//! Markdown report generation.
//!
//! This module generates the backlog report from the analysis results.

use crate::analysis::{Distribution, GroupAggregate, LogisticsReport, Metric, SlaSplit};
use crate::config::ReportConfig;
use crate::models::{AssistantAnswer, Record, Report, ReportMetadata};
use crate::offenders::OffenderBuckets;
use crate::summary::DataSummary;
use anyhow::Result;

/// Make free text safe inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report<'_>, settings: &ReportConfig) -> String {
    let analysis = &report.analysis;
    let mut output = String::new();

    // Title
    output.push_str("# Service Order Backlog Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_metrics_section(&analysis.metrics));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_offenders_section(
        &analysis.offenders,
        settings.max_rows_per_bucket,
    ));

    output.push_str(&generate_performance_table(
        "Performance by Executor",
        "Executor",
        &analysis.executor_performance,
    ));
    output.push_str(&generate_performance_table(
        "Performance by Analyst",
        "Analyst",
        &analysis.analyst_performance,
    ));
    output.push_str(&generate_performance_table(
        "Orders by Group",
        "Group",
        &analysis.group_breakdown,
    ));
    output.push_str(&generate_sla_by_group_section(&analysis.sla_by_group));
    output.push_str(&generate_distribution_section(
        "Status Distribution",
        "Status",
        &analysis.status_distribution,
    ));

    if settings.include_logistics {
        output.push_str(&generate_logistics_section(&analysis.logistics));
    }

    if let Some(ref answer) = report.assistant {
        output.push_str(&generate_assistant_section(answer));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source File:** `{}`\n", metadata.source_file));
    section.push_str(&format!(
        "- **Reference Time:** {}\n",
        metadata.reference_time.format("%Y-%m-%d %H:%M")
    ));
    section.push_str(&format!(
        "- **Generated At:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows Read:** {}\n", metadata.rows_read));
    section.push_str(&format!(
        "- **Orders in Scope:** {}\n",
        metadata.records_in_scope
    ));
    section.push_str(&format!(
        "- **Processing Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the headline metric table.
fn generate_metrics_section(metrics: &[Metric]) -> String {
    let mut section = String::new();

    section.push_str("## Headline Metrics\n\n");
    section.push_str("| Metric | Value | Level |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for metric in metrics {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            metric.title,
            metric.value,
            metric.level.emoji()
        ));
    }
    section.push('\n');

    section
}

/// Generate the overall SLA summary.
fn generate_summary_section(summary: &DataSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("- **Total Orders:** {}\n", summary.overall.total));
    section.push_str(&format!(
        "- **Within SLA:** {}\n",
        summary.overall.sla_label()
    ));
    section.push_str(&format!(
        "- **Average Stalled Days:** {:.1}\n\n",
        summary.overall.average_stalled_days
    ));

    section
}

/// Generate one table per offender bucket.
fn generate_offenders_section(offenders: &OffenderBuckets<'_>, max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Offenders\n\n");
    section.push_str("| Bucket | Orders |\n");
    section.push_str("|:---|:---:|\n");
    for (kind, records) in offenders.iter() {
        section.push_str(&format!("| {} | {} |\n", kind.title(), records.len()));
    }
    section.push('\n');

    for (kind, records) in offenders.iter() {
        if records.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", kind.title()));
        section.push_str(&generate_record_table(records, max_rows));
    }

    section
}

/// Generate a table of records, worst first.
fn generate_record_table(records: &[&Record], max_rows: usize) -> String {
    let mut table = String::new();

    let mut sorted: Vec<&Record> = records.to_vec();
    sorted.sort_by(|a, b| b.stalled_days.cmp(&a.stalled_days));

    table.push_str("| OS | Group | Executor | Status | Stalled Days | SLA | Analyst |\n");
    table.push_str("|:---|:---|:---|:---|:---:|:---:|:---|\n");
    for record in sorted.iter().take(max_rows) {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&record.id),
            escape_cell(record.group_key()),
            escape_cell(record.executor_key()),
            escape_cell(record.status_str()),
            record.stalled_days,
            record.sla_status,
            escape_cell(&record.assigned_analyst)
        ));
    }
    if sorted.len() > max_rows {
        table.push_str(&format!(
            "\n*{} more not shown.*\n",
            sorted.len() - max_rows
        ));
    }
    table.push('\n');

    table
}

/// Generate a performance table.
fn generate_performance_table(title: &str, key_label: &str, rows: &[GroupAggregate]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    if rows.is_empty() {
        section.push_str("No orders in scope.\n\n");
        return section;
    }

    section.push_str(&format!(
        "| {} | Orders | Avg Days | Max Days |\n",
        key_label
    ));
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {} |\n",
            escape_cell(&row.key),
            row.count,
            row.average_stalled_days,
            row.max_stalled_days
        ));
    }
    section.push('\n');

    section
}

/// Generate the SLA split per group.
fn generate_sla_by_group_section(rows: &[SlaSplit]) -> String {
    let mut section = String::new();

    section.push_str("## SLA by Group\n\n");
    if rows.is_empty() {
        section.push_str("No orders in scope.\n\n");
        return section;
    }

    section.push_str("| Group | Within SLA | Outside SLA | Total |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&row.group),
            row.within_sla,
            row.outside_sla,
            row.total
        ));
    }
    section.push('\n');

    section
}

/// Generate a two-column distribution table.
fn generate_distribution_section(title: &str, label: &str, rows: &[Distribution]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("| {} | Orders |\n", label));
    section.push_str("|:---|:---:|\n");
    for row in rows {
        section.push_str(&format!("| {} | {} |\n", escape_cell(&row.name), row.value));
    }
    section.push('\n');

    section
}

/// Generate the logistics sub-report.
fn generate_logistics_section(logistics: &LogisticsReport<'_>) -> String {
    let mut section = String::new();

    section.push_str("## Logistics\n\n");
    if logistics.total_items == 0 {
        section.push_str("No logistics orders in this export.\n\n");
        return section;
    }

    section.push_str(&format!("- **Items:** {}\n", logistics.total_items));
    section.push_str(&format!("- **Within SLA:** {}\n", logistics.within_sla));
    section.push_str(&format!("- **Outside SLA:** {}\n", logistics.outside_sla));
    section.push_str(&format!(
        "- **Overdue Scheduled:** {}\n",
        logistics.overdue_scheduled
    ));
    section.push_str(&format!(
        "- **Suspicious (> 2 days):** {}\n",
        logistics.suspicious_items.len()
    ));
    section.push_str(&format!(
        "- **Average Stalled Days:** {:.1}\n\n",
        logistics.average_stalled_days
    ));

    let by_executor =
        generate_performance_table("Logistics by Executor", "Executor", &logistics.by_executor);
    section.push_str(&by_executor.replacen("## ", "### ", 1));

    section
}

/// Generate the assistant answer section.
fn generate_assistant_section(answer: &AssistantAnswer) -> String {
    let mut section = String::new();

    section.push_str("## Assistant Analysis\n\n");
    section.push_str(&format!("> **Question:** {}\n\n", answer.question));
    section.push_str(&answer.answer);
    section.push_str(&format!("\n\n*Model: `{}`*\n\n", answer.model));

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by osaudit*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report<'_>) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::Config;
    use crate::models::columns;
    use crate::pipeline::tests::{fixed_now, row};
    use crate::pipeline::{Classification, Pipeline};
    use chrono::Utc;

    fn classify() -> Classification {
        let rows = vec![
            row(&[
                (columns::ID, "1001"),
                (columns::GROUP, "FIELD"),
                (columns::EXECUTOR, "Tech A"),
                (columns::STATUS, "ABERTO"),
                (columns::ENTERED_AT, "15/01/2024"),
                (columns::DEADLINE, "VENCIDO"),
            ]),
            row(&[
                (columns::ID, "1002"),
                (columns::GROUP, "CO"),
                (columns::STATUS, "PENDENTE"),
                (columns::ENTERED_AT, "18/01/2024"),
            ]),
            row(&[
                (columns::ID, "1003"),
                (columns::GROUP, "LOG SAS BH"),
                (columns::EXECUTOR, "Log Team"),
            ]),
        ];
        Pipeline::from_config(&Config::default()).run(&rows, fixed_now())
    }

    fn create_test_report(classification: &Classification) -> Report<'_> {
        let config = Config::default();
        let analysis = analyze(classification, &config);
        Report {
            metadata: ReportMetadata {
                source_file: "backlog.xlsx".to_string(),
                reference_time: fixed_now(),
                generated_at: Utc::now(),
                rows_read: analysis.rows_read,
                records_in_scope: analysis.records.len(),
                duration_seconds: 0.5,
            },
            summary: DataSummary::build(analysis.records),
            analysis,
            assistant: None,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let classification = classify();
        let report = create_test_report(&classification);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Service Order Backlog Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Headline Metrics"));
        assert!(markdown.contains("## Offenders"));
        assert!(markdown.contains("### Late Field Work"));
        assert!(markdown.contains("| 1001 | FIELD | Tech A | ABERTO | 5 | Outside SLA |"));
        assert!(markdown.contains("## Logistics"));
        assert!(markdown.contains("| Log Team | 1 |"));
        assert!(!markdown.contains("## Assistant Analysis"));
    }

    #[test]
    fn test_logistics_section_can_be_disabled() {
        let classification = classify();
        let report = create_test_report(&classification);
        let settings = ReportConfig {
            include_logistics: false,
            ..ReportConfig::default()
        };
        assert!(!generate_markdown_report(&report, &settings).contains("## Logistics"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("A | B"), "A \\| B");
        assert_eq!(escape_cell("line\r\nbreak\nend"), "line break end");
        assert_eq!(escape_cell("FIELD"), "FIELD");
    }

    #[test]
    fn test_table_cells_are_escaped() {
        let rows = vec![row(&[
            (columns::ID, "2001"),
            (columns::GROUP, "CO"),
            (columns::EXECUTOR, "Team A|B"),
            (columns::STATUS, "PENDENTE\nCLIENTE"),
            (columns::ENTERED_AT, "18/01/2024"),
        ])];
        let classification = Pipeline::from_config(&Config::default()).run(&rows, fixed_now());
        let report = create_test_report(&classification);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("| 2001 | CO | Team A\\|B | PENDENTE CLIENTE | 2 |"));
        assert!(markdown.contains("| Team A\\|B | 1 |"));
        assert!(markdown.contains("| PENDENTE CLIENTE | 1 |"));
        assert!(!markdown.contains("PENDENTE\nCLIENTE"));
    }

    #[test]
    fn test_record_table_truncation() {
        let classification = classify();
        let records: Vec<&Record> = classification.records.iter().collect();
        let table = generate_record_table(&records, 1);

        // Worst first: 1001 has five stalled days.
        assert!(table.contains("| 1001 |"));
        assert!(!table.contains("| 1002 |"));
        assert!(table.contains("1 more not shown"));
    }

    #[test]
    fn test_assistant_section() {
        let classification = classify();
        let mut report = create_test_report(&classification);
        report.assistant = Some(AssistantAnswer {
            model: "llama3.2:latest".to_string(),
            question: "Who is slowest?".to_string(),
            answer: "- Tech A".to_string(),
        });

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("## Assistant Analysis"));
        assert!(markdown.contains("Who is slowest?"));
    }

    #[test]
    fn test_generate_json_report() {
        let classification = classify();
        let report = create_test_report(&classification);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"late_field_work\""));
        assert!(json.contains("\"OutsideSLA\""));
        assert!(json.contains("\"by_executor\""));
        assert!(!json.contains("\"assistant\""));
    }
}
