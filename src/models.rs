//! Data models for the backlog auditor.
//!
//! This module contains the core data structures shared by the ingest
//! adapters, the classification pipeline, and the report generator.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel used when a record has no identifier.
pub const MISSING_ID: &str = "N/A";

/// Sentinel used for a missing analyst, executor or group key.
pub const UNASSIGNED: &str = "Unassigned";

/// Column names of the service-order export.
pub mod columns {
    pub const ID: &str = "NUMOS";
    pub const GROUP: &str = "NOMEGRUPO";
    pub const EXECUTOR: &str = "EXECUTANTE";
    pub const STATUS: &str = "STATUS_DA_OS";
    pub const CALLED_AT: &str = "DHCHAMADA";
    pub const ENTERED_AT: &str = "ENTRADA_SubOS";
    pub const SCHEDULED_AT: &str = "AGENDAMENTO";
    pub const DEFECT: &str = "DEFEITO";
    pub const SOLUTION: &str = "SOLUCAO";
    pub const DEADLINE: &str = "PRAZO_dd_hr_min_seg";
    pub const TECHNICAL_RESPONSIBLE: &str = "RESPONSAVEL_TECNICO";
    pub const PARTNER: &str = "NOMEPARC";
    pub const ECONOMIC_GROUP: &str = "GRUPO_ECONOMICO";
    pub const FINANCIAL_PROJECT: &str = "PROJETO_FINANCEIRO";
}

/// A raw spreadsheet cell, before any coercion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Missing column or blank cell.
    #[default]
    Empty,
    /// Numeric cell (spreadsheet dates arrive as serial numbers).
    Number(f64),
    /// Text cell.
    Text(String),
}

impl RawValue {
    /// Returns true for values a spreadsheet user would read as "nothing".
    pub fn is_falsy(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Number(n) => *n == 0.0 || n.is_nan(),
            RawValue::Text(s) => s.is_empty(),
        }
    }

    /// Coerces the cell into text; blank cells yield `None`.
    ///
    /// Integral numbers are rendered without a fractional part so that a
    /// numeric identifier like `123.0` reads as `"123"`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawValue::Empty => None,
            RawValue::Text(s) if s.is_empty() => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) if n.is_nan() => None,
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text().unwrap_or_default())
    }
}

/// One input row: column name to raw cell.
pub type RawRow = HashMap<String, RawValue>;

/// SLA status derived from the deadline description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SlaStatus {
    #[default]
    WithinSLA,
    OutsideSLA,
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaStatus::WithinSLA => write!(f, "Within SLA"),
            SlaStatus::OutsideSLA => write!(f, "Outside SLA"),
        }
    }
}

/// Record fields that attribution rules can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    TechnicalResponsible,
    Partner,
    EconomicGroup,
    FinancialProject,
}

/// A classified service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Order identifier (`N/A` when absent).
    pub id: String,
    /// Owning team.
    pub group: Option<String>,
    /// Technician or team doing the physical work.
    pub executor: Option<String>,
    /// Workflow status as exported.
    pub status: Option<String>,
    /// Call-opened timestamp, raw.
    pub called_at: RawValue,
    /// Entry timestamp of the current sub-order, raw.
    pub entered_at: RawValue,
    /// Scheduled visit timestamp, raw.
    pub scheduled_at: RawValue,
    pub defect: Option<String>,
    pub solution: Option<String>,
    /// Free-text deadline description; drives the SLA status.
    pub deadline: String,
    /// Business days since entry.
    pub stalled_days: u32,
    pub sla_status: SlaStatus,
    pub technical_responsible: Option<String>,
    pub partner: Option<String>,
    pub economic_group: Option<String>,
    pub financial_project: Option<String>,
    /// Back-office analyst accountable for the order.
    pub assigned_analyst: String,
}

impl Record {
    /// Value of a rule-inspectable field; absent fields read as empty.
    pub fn rule_field(&self, field: RuleField) -> &str {
        let value = match field {
            RuleField::TechnicalResponsible => &self.technical_responsible,
            RuleField::Partner => &self.partner,
            RuleField::EconomicGroup => &self.economic_group,
            RuleField::FinancialProject => &self.financial_project,
        };
        value.as_deref().unwrap_or("")
    }

    pub fn status_str(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }

    /// Group name, or the unassigned sentinel.
    pub fn group_key(&self) -> &str {
        self.group.as_deref().unwrap_or(UNASSIGNED)
    }

    /// Executor name, or the unassigned sentinel.
    pub fn executor_key(&self) -> &str {
        self.executor.as_deref().unwrap_or(UNASSIGNED)
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Input file that was processed.
    pub source_file: String,
    /// Reference "now" used for every date decision in this run.
    pub reference_time: NaiveDateTime,
    /// Wall-clock time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Rows read from the input.
    pub rows_read: usize,
    /// Records kept after the team/analyst filter.
    pub records_in_scope: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// Answer returned by the assistant for a user question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub model: String,
    pub question: String,
    pub answer: String,
}

/// The complete backlog report.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub metadata: ReportMetadata,
    pub analysis: crate::analysis::Analysis<'a>,
    pub summary: crate::summary::DataSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantAnswer>,
}
