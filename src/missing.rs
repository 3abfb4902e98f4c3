//! The single "missing value" concept.
//!
//! Sources encode absent data in several ways: JSON `null`, empty cells, and sentinel strings such
//! as `NaN` or `N/A`. Everything downstream of [`MissingMarkers::is_missing`] only sees `null`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel strings treated as missing by default.
///
/// This is the token set dataframe CSV readers recognise as NA out of the box.
pub const DEFAULT_MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns `true` for JSON `null` and for empty or whitespace-only strings.
///
/// This is the part of the missing-value predicate that holds regardless of configuration.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Configurable set of sentinel strings that mean "no value".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingMarkers {
    tokens: BTreeSet<String>,
}

impl Default for MissingMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_TOKENS.iter().copied())
    }
}

impl MissingMarkers {
    /// Create a marker set from explicit tokens.
    ///
    /// Blank values are always missing, whether or not `""` is listed.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// A marker set that only treats blank values as missing.
    pub fn blank_only() -> Self {
        Self {
            tokens: BTreeSet::new(),
        }
    }

    /// Returns `true` if `value` represents an absent cell.
    ///
    /// Sentinel tokens are compared after trimming surrounding whitespace. Non-string values other
    /// than `null` are never missing.
    pub fn is_missing(&self, value: &Value) -> bool {
        if is_blank(value) {
            return true;
        }
        match value {
            Value::String(s) => self.tokens.contains(s.trim()),
            _ => false,
        }
    }

    /// Iterate the configured tokens in sorted order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
