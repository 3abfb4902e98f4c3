//! CSV loading.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::{SourceReadError, SourceResult};
use crate::types::{Dataset, RawRow};

/// Load a CSV file into an in-memory [`Dataset`].
///
/// Rules:
///
/// - The first line is the header; column order is preserved.
/// - Header names must be unique.
/// - Every record must have as many fields as the header; a short or long record is a fatal
///   [`SourceReadError::Csv`], as is invalid UTF-8.
/// - Cells are kept as strings, untrimmed. Typing happens later (scalar inference, normalization).
pub fn load_csv_from_path(path: impl AsRef<Path>, delimiter: u8) -> SourceResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)?;
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
pub fn load_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> SourceResult<Dataset> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(SourceReadError::SchemaMismatch {
            message: "csv has no header row".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(headers.len());
    for h in headers.iter() {
        if !seen.insert(h) {
            return Err(SourceReadError::SchemaMismatch {
                message: format!("duplicate column '{h}' in header"),
            });
        }
    }
    let columns: Vec<String> = headers.iter().map(str::to_owned).collect();

    let mut rows: Vec<RawRow> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut row = RawRow::new();
        for (column, cell) in columns.iter().zip(record.iter()) {
            row.insert(column.clone(), Value::String(cell.to_owned()));
        }
        rows.push(row);
    }

    Ok(Dataset::new(columns, rows))
}
