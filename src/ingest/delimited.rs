//! CSV input.
//!
//! Cells that parse fully as numbers become numeric, matching how a
//! spreadsheet would import the same file; everything else stays text.

use super::{zip_row, IngestError};
use crate::models::{RawRow, RawValue};
use std::io::Read;
use std::path::Path;

/// Convert one CSV field into a raw cell.
pub fn field_to_raw(field: &str) -> RawValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return RawValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => RawValue::Number(n),
        _ => RawValue::Text(field.to_string()),
    }
}

/// Read rows from any CSV source with a header line.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(zip_row(&headers, record.iter().map(field_to_raw)));
    }

    Ok(rows)
}

/// Read rows from a CSV file path.
pub fn read_csv_file(path: &Path) -> Result<Vec<RawRow>, IngestError> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::columns;

    const SAMPLE_CSV: &str = "\
NUMOS,NOMEGRUPO,STATUS_DA_OS,ENTRADA_SubOS,PRAZO_dd_hr_min_seg
101,FIELD,ABERTO,15/01/2024 08:00:00,VENCIDO
102,CO,PENDENTE,45306,
";

    #[test]
    fn test_field_to_raw() {
        assert_eq!(field_to_raw(""), RawValue::Empty);
        assert_eq!(field_to_raw("  "), RawValue::Empty);
        assert_eq!(field_to_raw("45306"), RawValue::Number(45306.0));
        assert_eq!(field_to_raw("1.5"), RawValue::Number(1.5));
        assert_eq!(field_to_raw("FIELD"), RawValue::Text("FIELD".to_string()));
        assert_eq!(field_to_raw("NaN"), RawValue::Text("NaN".to_string()));
    }

    #[test]
    fn test_read_sample_csv() {
        let rows = read_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0][columns::ID], RawValue::Number(101.0));
        assert_eq!(rows[0][columns::GROUP], RawValue::Text("FIELD".to_string()));
        assert_eq!(
            rows[0][columns::ENTERED_AT],
            RawValue::Text("15/01/2024 08:00:00".to_string())
        );
        assert_eq!(rows[1][columns::ENTERED_AT], RawValue::Number(45306.0));
        assert_eq!(rows[1][columns::DEADLINE], RawValue::Empty);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let rows = read_csv("NUMOS,NOMEGRUPO,EXECUTANTE\n7,FIELD\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key(columns::EXECUTOR));
    }

    #[test]
    fn test_header_only() {
        let rows = read_csv("NUMOS,NOMEGRUPO\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }
}
