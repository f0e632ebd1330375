//! Input adapters.
//!
//! Converts a spreadsheet export into the ordered row sequence the
//! classification pipeline consumes. The first row of the sheet is the
//! header; every later row becomes a column → cell map.

pub mod delimited;
pub mod workbook;

use crate::models::RawRow;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// File extensions read through the workbook adapter.
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Errors raised while reading an input file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported input format '{0}' (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)")]
    UnsupportedFormat(String),
    #[error("failed to open workbook: {0}")]
    Workbook(String),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whether the path has an extension this module can read.
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| ext == "csv" || WORKBOOK_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Load all rows from a supported file.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>, IngestError> {
    let ext = extension(path).unwrap_or_default();

    let rows = if ext == "csv" {
        delimited::read_csv_file(path)?
    } else if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        workbook::read_workbook(path)?
    } else {
        return Err(IngestError::UnsupportedFormat(ext));
    };

    if rows.is_empty() {
        warn!("{} contains no data rows", path.display());
    } else {
        info!("Read {} rows from {}", rows.len(), path.display());
    }

    Ok(rows)
}

/// Zip a header row with a data row, skipping blank header cells.
pub(crate) fn zip_row<I>(headers: &[String], cells: I) -> RawRow
where
    I: IntoIterator<Item = crate::models::RawValue>,
{
    headers
        .iter()
        .zip(cells)
        .filter(|(header, _)| !header.is_empty())
        .map(|(header, cell)| (header.clone(), cell))
        .collect()
}
