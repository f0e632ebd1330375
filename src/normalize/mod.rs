//! Field normalization.
//!
//! Turns a raw spreadsheet row into a typed [`Record`] whose derived fields
//! still hold their defaults; the pipeline fills those in.

pub mod business_days;
pub mod dates;

pub use business_days::stalled_days;
pub use dates::parse_date;

use crate::models::{columns, RawRow, RawValue, Record, SlaStatus, MISSING_ID, UNASSIGNED};

fn raw(row: &RawRow, column: &str) -> RawValue {
    row.get(column).cloned().unwrap_or_default()
}

fn text(row: &RawRow, column: &str) -> Option<String> {
    row.get(column).and_then(RawValue::to_text)
}

/// Build a record from a raw row. Missing columns degrade to sentinels.
pub fn record_from_row(row: &RawRow) -> Record {
    Record {
        id: text(row, columns::ID).unwrap_or_else(|| MISSING_ID.to_string()),
        group: text(row, columns::GROUP),
        executor: text(row, columns::EXECUTOR),
        status: text(row, columns::STATUS),
        called_at: raw(row, columns::CALLED_AT),
        entered_at: raw(row, columns::ENTERED_AT),
        scheduled_at: raw(row, columns::SCHEDULED_AT),
        defect: text(row, columns::DEFECT),
        solution: text(row, columns::SOLUTION),
        deadline: text(row, columns::DEADLINE).unwrap_or_default(),
        stalled_days: 0,
        sla_status: SlaStatus::WithinSLA,
        technical_responsible: text(row, columns::TECHNICAL_RESPONSIBLE),
        partner: text(row, columns::PARTNER),
        economic_group: text(row, columns::ECONOMIC_GROUP),
        financial_project: text(row, columns::FINANCIAL_PROJECT),
        assigned_analyst: UNASSIGNED.to_string(),
    }
}
