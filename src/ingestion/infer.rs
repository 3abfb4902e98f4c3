//! Per-column scalar inference for text sources.
//!
//! CSV cells arrive as strings. A column whose present cells all look like integers is converted
//! to integers, else a column whose present cells all look like finite floats is converted to
//! floats; any other column stays text. Missing cells are left as they are.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::missing::MissingMarkers;
use crate::types::Dataset;

/// Whether text cells are converted to numbers after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarInference {
    /// Keep every cell as text.
    Off,
    /// Infer an integer or float type per column.
    #[default]
    PerColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Convert numeric-looking columns of `dataset` in place.
///
/// Columns with no present cells are left untouched.
pub fn infer_scalar_columns(dataset: &mut Dataset, missing: &MissingMarkers) {
    for column in &dataset.columns {
        let kind = column_kind(dataset, column, missing);
        if kind == ColumnKind::Text {
            continue;
        }
        for row in &mut dataset.rows {
            let Some(cell) = row.get_mut(column) else {
                continue;
            };
            if missing.is_missing(cell) {
                continue;
            }
            if let Some(converted) = cell.as_str().and_then(|s| convert(s, kind)) {
                *cell = converted;
            }
        }
    }
}

fn column_kind(dataset: &Dataset, column: &str, missing: &MissingMarkers) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in dataset.rows.iter().filter_map(|row| row.get(column)) {
        if missing.is_missing(cell) {
            continue;
        }
        let Some(text) = cell.as_str() else {
            return ColumnKind::Text;
        };
        let cell_kind = if text.parse::<i64>().is_ok() {
            ColumnKind::Int
        } else if text.parse::<f64>().is_ok_and(f64::is_finite) {
            ColumnKind::Float
        } else {
            return ColumnKind::Text;
        };
        kind = Some(match (kind, cell_kind) {
            (Some(ColumnKind::Float), _) | (_, ColumnKind::Float) => ColumnKind::Float,
            _ => ColumnKind::Int,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn convert(text: &str, kind: ColumnKind) -> Option<Value> {
    match kind {
        ColumnKind::Int => text.parse::<i64>().ok().map(|n| Value::Number(n.into())),
        ColumnKind::Float => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ColumnKind::Text => None,
    }
}
