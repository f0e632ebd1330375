//! Date parsing for heterogeneous spreadsheet cells.
//!
//! Cells arrive as serial numbers, `dd/mm/yyyy hh:mm:ss`-style text, or
//! occasionally something else entirely. Workbook ISO date cells are turned
//! into serial numbers at ingest. Anything that cannot be read becomes
//! `None`; nothing here returns an error.

use crate::models::RawValue;
use chrono::{Duration, NaiveDate};

/// Delimiters that split positional day/month/year text.
const DELIMITERS: [char; 4] = ['/', '-', ' ', ':'];

/// Formats for text with fewer than two delimiters.
const FALLBACK_FORMATS: [&str; 3] = ["%Y%m%d", "%d.%m.%Y", "%Y.%m.%d"];

/// Parse a raw cell into a calendar date.
pub fn parse_date(value: &RawValue) -> Option<NaiveDate> {
    if value.is_falsy() {
        return None;
    }

    match value {
        RawValue::Number(serial) => from_serial(*serial),
        RawValue::Text(text) => parse_text(text),
        RawValue::Empty => None,
    }
}

/// Whole days after 1899-12-30; the time-of-day fraction is dropped.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    // Serial 0 is 1899-12-30.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
}

fn parse_text(text: &str) -> Option<NaiveDate> {
    let delimiter_count = text.chars().filter(|c| DELIMITERS.contains(c)).count();
    if delimiter_count >= 2 {
        return parse_day_month_year(text);
    }
    parse_generic(text)
}

/// First three tokens are day, month, year in that order.
fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    let mut tokens = text.split(|c| DELIMITERS.contains(&c));
    let day = tokens.next()?.trim();
    let month = tokens.next()?.trim();
    let year = tokens.next()?.trim();

    let year = if year.len() == 2 {
        format!("20{}", year)
    } else {
        year.to_string()
    };

    NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
