//! Classification pipeline.
//!
//! Normalizes every row, computes stalled days against a single captured
//! "now", tags the SLA status, resolves the responsible analyst, and then
//! narrows the result to the operational teams this report covers.

use crate::attribution::AttributionResolver;
use crate::config::{Config, FiltersConfig};
use crate::models::{RawRow, Record, SlaStatus};
use crate::normalize::{parse_date, record_from_row, stalled_days};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Deadline descriptions that mean the SLA is already blown.
static OUTSIDE_SLA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)FORA|OVERDUE|VENCIDO|EXPIRADO").expect("static SLA pattern")
});

/// SLA status for a free-text deadline description.
pub fn sla_status(deadline: &str) -> SlaStatus {
    if OUTSIDE_SLA.is_match(deadline) {
        SlaStatus::OutsideSLA
    } else {
        SlaStatus::WithinSLA
    }
}

/// Output of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// The reference time every date decision used.
    pub now: NaiveDateTime,
    /// Canonical set: operational teams, excluded analysts removed.
    pub records: Vec<Record>,
    /// Every classified row, in input order.
    pub unfiltered: Vec<Record>,
}

impl Classification {
    /// Rows that were classified but fell outside the canonical set.
    pub fn excluded_count(&self) -> usize {
        self.unfiltered.len() - self.records.len()
    }
}

/// The classification pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: AttributionResolver,
    filters: FiltersConfig,
}

impl Pipeline {
    pub fn new(resolver: AttributionResolver, filters: FiltersConfig) -> Self {
        Self { resolver, filters }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AttributionResolver::from_config(&config.rules),
            config.filters.clone(),
        )
    }

    /// Classify a single row.
    pub fn classify_row(&self, row: &RawRow, now: NaiveDateTime) -> Record {
        let mut record = record_from_row(row);
        record.stalled_days = stalled_days(parse_date(&record.entered_at), now.date());
        record.sla_status = sla_status(&record.deadline);
        record.assigned_analyst = self.resolver.resolve(&record);
        record
    }

    /// Whether a classified record belongs to the canonical set.
    pub fn in_scope(&self, record: &Record) -> bool {
        let group_allowed = record
            .group
            .as_ref()
            .is_some_and(|group| self.filters.operational_groups.contains(group));

        group_allowed && !self.filters.excluded_analysts.contains(&record.assigned_analyst)
    }

    /// Classify a full batch.
    pub fn run(&self, rows: &[RawRow], now: NaiveDateTime) -> Classification {
        if rows.is_empty() {
            warn!("No rows to classify; the report will be empty");
        }

        let unfiltered: Vec<Record> = rows.iter().map(|row| self.classify_row(row, now)).collect();

        let records: Vec<Record> = unfiltered
            .iter()
            .filter(|record| self.in_scope(record))
            .cloned()
            .collect();

        info!(
            "Classified {} rows, {} in scope ({} excluded)",
            unfiltered.len(),
            records.len(),
            unfiltered.len() - records.len()
        );
        debug!("Reference time: {}", now);

        Classification {
            now,
            records,
            unfiltered,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{columns, RawValue, UNASSIGNED};
    use chrono::{NaiveDate, NaiveTime};

    /// Monday 2024-01-22, 10:00.
    pub(crate) fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
    }

    pub(crate) fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_sla_status_keywords() {
        assert_eq!(sla_status("VENCIDO"), SlaStatus::OutsideSLA);
        assert_eq!(sla_status("fora do prazo"), SlaStatus::OutsideSLA);
        assert_eq!(sla_status("Overdue 2d"), SlaStatus::OutsideSLA);
        assert_eq!(sla_status("expirado"), SlaStatus::OutsideSLA);
        assert_eq!(sla_status("02:10:00:00"), SlaStatus::WithinSLA);
        assert_eq!(sla_status(""), SlaStatus::WithinSLA);
    }

    #[test]
    fn test_end_to_end_late_field_record() {
        let pipeline = Pipeline::from_config(&Config::default());
        // Monday to Monday: six weekdays, five stalled days.
        let rows = vec![row(&[
            (columns::ID, "1"),
            (columns::GROUP, "FIELD"),
            (columns::STATUS, "ABERTO"),
            (columns::ENTERED_AT, "15/01/2024 08:00:00"),
            (columns::DEADLINE, "VENCIDO"),
        ])];

        let result = pipeline.run(&rows, fixed_now());
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.id, "1");
        assert_eq!(record.stalled_days, 5);
        assert_eq!(record.sla_status, SlaStatus::OutsideSLA);
        assert_eq!(record.assigned_analyst, UNASSIGNED);
    }

    #[test]
    fn test_filter_by_group_and_excluded_analyst() {
        let pipeline = Pipeline::from_config(&Config::default());
        let rows = vec![
            row(&[(columns::ID, "1"), (columns::GROUP, "FIELD")]),
            row(&[(columns::ID, "2"), (columns::GROUP, "LOG SAS BH")]),
            row(&[(columns::ID, "3")]),
            // DIVALDO_M maps to an excluded analyst.
            row(&[
                (columns::ID, "4"),
                (columns::GROUP, "CO"),
                (columns::TECHNICAL_RESPONSIBLE, "DIVALDO_M"),
            ]),
            row(&[
                (columns::ID, "5"),
                (columns::GROUP, "CO"),
                (columns::TECHNICAL_RESPONSIBLE, "ALEX_V"),
            ]),
        ];

        let result = pipeline.run(&rows, fixed_now());
        let ids: Vec<&str> = result.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(result.unfiltered.len(), 5);
        assert_eq!(result.excluded_count(), 3);
    }

    #[test]
    fn test_group_filter_is_case_sensitive() {
        let pipeline = Pipeline::from_config(&Config::default());
        let result = pipeline.run(&[row(&[(columns::GROUP, "field")])], fixed_now());
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_derived_fields_always_populated() {
        let pipeline = Pipeline::from_config(&Config::default());
        let rows = vec![
            RawRow::new(),
            row(&[(columns::ENTERED_AT, "garbage")]),
            row(&[(columns::ENTERED_AT, "01/01/2030")]),
        ];

        let result = pipeline.run(&rows, fixed_now());
        for record in &result.unfiltered {
            assert_eq!(record.stalled_days, 0);
            assert_eq!(record.sla_status, SlaStatus::WithinSLA);
            assert!(!record.assigned_analyst.is_empty());
            assert!(!record.id.is_empty());
        }
    }

    #[test]
    fn test_serial_entry_date() {
        let pipeline = Pipeline::from_config(&Config::default());
        let mut raw = row(&[(columns::GROUP, "FIELD")]);
        // 45306 is Monday 2024-01-15.
        raw.insert(columns::ENTERED_AT.to_string(), RawValue::Number(45306.0));
        let record = pipeline.classify_row(&raw, fixed_now());
        assert_eq!(record.stalled_days, 5);
    }

    #[test]
    fn test_run_is_idempotent() {
        let pipeline = Pipeline::from_config(&Config::default());
        let rows = vec![
            row(&[
                (columns::ID, "10"),
                (columns::GROUP, "FIELD"),
                (columns::ENTERED_AT, "10/01/2024"),
                (columns::PARTNER, "NEC Telecom"),
            ]),
            row(&[(columns::ID, "11"), (columns::GROUP, "CO")]),
        ];

        let first = pipeline.run(&rows, fixed_now());
        let second = pipeline.run(&rows, fixed_now());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_well_formed() {
        let pipeline = Pipeline::from_config(&Config::default());
        let result = pipeline.run(&[], fixed_now());
        assert!(result.records.is_empty());
        assert!(result.unfiltered.is_empty());
        assert_eq!(result.excluded_count(), 0);
    }
}
