//! Spreadsheet workbook input via calamine.

use super::{zip_row, IngestError};
use crate::models::{RawRow, RawValue};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serial day number (days after 1899-12-30) of an ISO 8601 date cell.
///
/// ODS files and `t="d"` xlsx cells store dates as ISO text instead of a
/// serial number.
fn iso_to_serial(text: &str) -> Option<f64> {
    let text = text.trim();
    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::default()))
        })
        .ok()?;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::default());
    Some((datetime - epoch).num_seconds() as f64 / SECONDS_PER_DAY)
}

/// Convert a calamine cell into a raw cell.
///
/// Date cells become serial numbers so the date normalizer sees the same
/// value for xlsx, xls and ods input.
pub fn cell_to_raw(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) if s.is_empty() => RawValue::Empty,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(true) => RawValue::Text("true".to_string()),
        Data::Bool(false) => RawValue::Empty,
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => match iso_to_serial(s) {
            Some(serial) => RawValue::Number(serial),
            None => RawValue::Text(s.clone()),
        },
        Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Error(_) => RawValue::Empty,
    }
}

fn header_text(cell: &Data) -> String {
    cell_to_raw(cell).to_text().unwrap_or_default().trim().to_string()
}

/// Convert sheet rows (header first) into raw rows.
pub fn rows_from_sheet<'c, I>(mut sheet_rows: I) -> Vec<RawRow>
where
    I: Iterator<Item = &'c [Data]>,
{
    let Some(header) = sheet_rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.iter().map(header_text).collect();

    sheet_rows
        .map(|cells| zip_row(&headers, cells.iter().map(cell_to_raw)))
        .filter(|row| row.values().any(|cell| *cell != RawValue::Empty))
        .collect()
}

/// Read the first worksheet of a workbook.
pub fn read_workbook(path: &Path) -> Result<Vec<RawRow>, IngestError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestError::NoWorksheet)?;
    debug!("Reading worksheet '{}'", sheet_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    Ok(rows_from_sheet(range.rows()))
}
