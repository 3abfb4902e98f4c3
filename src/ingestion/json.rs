//! JSON loading.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"id":1}, {"id":2}]`
//! - A single JSON object (one row)
//! - Newline-delimited JSON (NDJSON): `{"id":1}\n{"id":2}\n`
//!
//! Columns are the union of object keys in first-seen order. Cells keep their JSON types, so a
//! JSON source may already carry native booleans or nested arrays.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{SourceReadError, SourceResult};
use crate::types::{Dataset, RawRow};

/// Load a JSON / NDJSON file into a [`Dataset`].
pub fn load_json_from_path(path: impl AsRef<Path>) -> SourceResult<Dataset> {
    let text = fs::read_to_string(path)?;
    load_json_from_str(&text)
}

/// Load JSON / NDJSON from an in-memory string.
pub fn load_json_from_str(input: &str) -> SourceResult<Dataset> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SourceReadError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // A single document first, NDJSON otherwise.
    let values = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items,
        Ok(v @ Value::Object(_)) => vec![v],
        Ok(_) => {
            return Err(SourceReadError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            });
        }
        Err(_) => parse_ndjson(trimmed)?,
    };

    rows_from_values(values)
}

fn parse_ndjson(input: &str) -> SourceResult<Vec<Value>> {
    let mut values = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v = serde_json::from_str::<Value>(line).map_err(|e| SourceReadError::SchemaMismatch {
            message: format!("invalid ndjson at line {}: {}", i + 1, e),
        })?;
        values.push(v);
    }
    Ok(values)
}

fn rows_from_values(values: Vec<Value>) -> SourceResult<Dataset> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<RawRow> = Vec::with_capacity(values.len());

    for (idx0, v) in values.into_iter().enumerate() {
        let Value::Object(obj) = v else {
            return Err(SourceReadError::SchemaMismatch {
                message: format!("row {} is not a json object", idx0 + 1),
            });
        };
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        rows.push(obj);
    }

    Ok(Dataset::new(columns, rows))
}
