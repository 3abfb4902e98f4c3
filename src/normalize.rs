//! Row normalization: raw cells in, typed document out.
//!
//! [`normalize`] is pure: the output depends only on the input row, the column list and the
//! [`NormalizerConfig`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{coerce_boolean, coerce_structured};
use crate::missing::MissingMarkers;
use crate::types::{Dataset, Document, RawRow};

/// Columns whose cells hold JSON- or Python-literal-encoded nested data.
pub const STRUCTURED_FIELDS: [&str; 5] = [
    "belongs_to_collection",
    "genres",
    "production_companies",
    "production_countries",
    "spoken_languages",
];

/// Columns whose cells hold `"True"` / `"False"`.
pub const BOOLEAN_FIELDS: [&str; 2] = ["adult", "video"];

/// Which columns get which coercion, and what counts as missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub structured_fields: Vec<String>,
    pub boolean_fields: Vec<String>,
    /// Sentinel strings mapped to `null` in every column.
    pub missing: MissingMarkers,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            structured_fields: STRUCTURED_FIELDS.iter().map(|s| s.to_string()).collect(),
            boolean_fields: BOOLEAN_FIELDS.iter().map(|s| s.to_string()).collect(),
            missing: MissingMarkers::default(),
        }
    }
}

impl NormalizerConfig {
    fn is_structured(&self, column: &str) -> bool {
        self.structured_fields.iter().any(|f| f == column)
    }

    fn is_boolean(&self, column: &str) -> bool {
        self.boolean_fields.iter().any(|f| f == column)
    }
}

/// Normalize one row into a document.
///
/// - The document has exactly the keys in `columns`, in that order; row entries outside
///   `columns` are dropped and columns absent from the row become `null`.
/// - Missing cells become `null` in every column.
/// - Structured columns go through [`coerce_structured`], boolean columns through
///   [`coerce_boolean`]; a column listed as both is treated as structured.
pub fn normalize(row: &RawRow, columns: &[String], config: &NormalizerConfig) -> Document {
    let mut doc = Document::new();
    for column in columns {
        let raw = row.get(column).unwrap_or(&Value::Null);
        let value = if config.missing.is_missing(raw) {
            Value::Null
        } else if config.is_structured(column) {
            coerce_structured(raw).value
        } else if config.is_boolean(column) {
            coerce_boolean(raw)
        } else {
            raw.clone()
        };
        doc.insert(column.clone(), value);
    }
    doc
}

/// Lazily normalize every row of `dataset`, in order.
pub fn normalize_dataset<'a>(
    dataset: &'a Dataset,
    config: &'a NormalizerConfig,
) -> impl ExactSizeIterator<Item = Document> + 'a {
    dataset
        .rows
        .iter()
        .map(move |row| normalize(row, &dataset.columns, config))
}
