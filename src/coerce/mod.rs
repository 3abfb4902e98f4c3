//! Best-effort typed conversion of single raw cells.
//!
//! Nothing in this module returns an error: every failure degrades to a fallback value so that a
//! malformed cell still yields a document instead of aborting ingestion.
//!
//! Structured cells are parsed by an ordered chain of [`ParseStrategy`]s. The first strategy that
//! produces an array or object wins; if none does, the raw value is kept unchanged.
//!
//! Text in Python literal syntax is read by [`ParseStrategy::PythonLiteral`]. Single-quoted text
//! that uses JSON's lowercase `true`/`false`/`null` is not a Python literal; the last strategy,
//! [`ParseStrategy::QuoteSwappedJson`], reads it as JSON with every `'` turned into `"`.
//!
//! ```rust
//! use movie_docload::coerce::{coerce_boolean, coerce_structured};
//! use serde_json::json;
//!
//! let genres = coerce_structured(&json!("[{'id': 16, 'name': 'Animation'}]"));
//! assert!(genres.ok);
//! assert_eq!(genres.value, json!([{"id": 16, "name": "Animation"}]));
//!
//! let broken = coerce_structured(&json!("[{'id': 16"));
//! assert!(!broken.ok);
//! assert_eq!(broken.value, json!("[{'id': 16"));
//!
//! assert_eq!(coerce_boolean(&json!("False")), json!(false));
//! assert_eq!(coerce_boolean(&json!("yes")), json!("yes"));
//! ```

pub mod literal;

use serde_json::Value;
use tracing::debug;

use crate::missing::is_blank;
use crate::types::CellValue;

pub use literal::{LiteralError, parse_literal};

/// A single way of reading structured text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Strict JSON (double-quoted keys and strings).
    StrictJson,
    /// Python literal syntax (single quotes, `True`/`False`/`None`, tuples).
    PythonLiteral,
    /// JSON after replacing every `'` with `"`.
    ///
    /// Breaks on apostrophes inside strings, so it runs after [`Self::PythonLiteral`].
    QuoteSwappedJson,
}

impl ParseStrategy {
    /// The default order in which strategies are tried.
    pub const CHAIN: [ParseStrategy; 3] = [
        ParseStrategy::StrictJson,
        ParseStrategy::PythonLiteral,
        ParseStrategy::QuoteSwappedJson,
    ];

    /// Try to parse `text` as a structured value.
    ///
    /// Returns `None` if the text does not parse, or parses to a scalar.
    pub fn parse(self, text: &str) -> Option<Value> {
        let parsed = match self {
            Self::StrictJson => serde_json::from_str::<Value>(text).ok()?,
            Self::PythonLiteral => parse_literal(text).ok()?,
            Self::QuoteSwappedJson => serde_json::from_str::<Value>(&text.replace('\'', "\"")).ok()?,
        };
        is_structured(&parsed).then_some(parsed)
    }
}

/// Result of [`coerce_structured`].
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// The coerced value, or the raw input when `ok` is `false`.
    pub value: Value,
    /// `false` if every strategy failed and `value` is the untouched raw input.
    pub ok: bool,
}

impl Coerced {
    fn parsed(value: Value) -> Self {
        Self { value, ok: true }
    }

    fn fallback(raw: &CellValue) -> Self {
        Self {
            value: raw.clone(),
            ok: false,
        }
    }
}

fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Coerce a raw structured cell using [`ParseStrategy::CHAIN`].
///
/// - blank / `null` input gives `null`
/// - arrays and objects (from JSON sources) pass through unchanged
/// - text is parsed by each strategy in turn; on total failure the raw value is returned with
///   `ok = false`
/// - other scalars (numbers, booleans) are not structured and fall back unchanged
pub fn coerce_structured(raw: &CellValue) -> Coerced {
    coerce_structured_with(raw, &ParseStrategy::CHAIN)
}

/// Like [`coerce_structured`], with an explicit strategy chain.
pub fn coerce_structured_with(raw: &CellValue, strategies: &[ParseStrategy]) -> Coerced {
    if is_blank(raw) {
        return Coerced::parsed(Value::Null);
    }

    match raw {
        Value::Array(_) | Value::Object(_) => Coerced::parsed(raw.clone()),
        Value::String(text) => {
            let text = text.trim();
            match strategies.iter().find_map(|strategy| strategy.parse(text)) {
                Some(value) => Coerced::parsed(value),
                None => {
                    debug!(raw = %text, "structured cell did not parse; keeping raw text");
                    Coerced::fallback(raw)
                }
            }
        }
        _ => Coerced::fallback(raw),
    }
}

/// Coerce a raw boolean cell.
///
/// `"True"` / `"False"` and native booleans map to booleans; anything else, including missing
/// values and other spellings such as `"true"` or `"1"`, is returned unchanged.
pub fn coerce_boolean(raw: &CellValue) -> CellValue {
    match raw {
        Value::Bool(b) => Value::Bool(*b),
        Value::String(s) if s == "True" => Value::Bool(true),
        Value::String(s) if s == "False" => Value::Bool(false),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ParseStrategy, coerce_boolean, coerce_structured, coerce_structured_with};

    #[test]
    fn strict_json_is_tried_first() {
        let out = coerce_structured(&json!(r#"[{"iso_3166_1": "US", "name": "United States of America"}]"#));
        assert!(out.ok);
        assert_eq!(out.value, json!([{"iso_3166_1": "US", "name": "United States of America"}]));
    }

    #[test]
    fn python_literal_is_the_second_strategy() {
        let raw = json!("{'id': 10194, 'name': 'Toy Story Collection', 'backdrop_path': None}");
        assert!(ParseStrategy::StrictJson.parse(raw.as_str().unwrap()).is_none());

        let out = coerce_structured(&raw);
        assert!(out.ok);
        assert_eq!(out.value["backdrop_path"], json!(null));

        let json_only = coerce_structured_with(&raw, &[ParseStrategy::StrictJson]);
        assert!(!json_only.ok);
        assert_eq!(json_only.value, raw);
    }

    #[test]
    fn single_quoted_json_tokens_parse_after_quote_swap() {
        let out = coerce_structured(&json!("[{'id': 1, 'flag': true}]"));
        assert!(out.ok);
        assert_eq!(out.value, json!([{"id": 1, "flag": true}]));

        let out = coerce_structured(&json!("{'backdrop_path': null, 'adult': false}"));
        assert!(out.ok);
        assert_eq!(out.value, json!({"backdrop_path": null, "adult": false}));

        let raw = json!("{'backdrop_path': null}");
        let literal_only =
            coerce_structured_with(&raw, &[ParseStrategy::StrictJson, ParseStrategy::PythonLiteral]);
        assert!(!literal_only.ok);
    }

    #[test]
    fn apostrophes_are_read_by_the_literal_parser_before_quote_swap() {
        let out = coerce_structured(&json!(r#"[{'id': 11, 'name': "Schindler's List"}]"#));
        assert!(out.ok);
        assert_eq!(out.value, json!([{"id": 11, "name": "Schindler's List"}]));
    }

    #[test]
    fn invalid_text_falls_back_to_raw_string() {
        let raw = json!("not valid json or literal");
        let out = coerce_structured(&raw);
        assert!(!out.ok);
        assert_eq!(out.value, raw);
    }

    #[test]
    fn fallback_keeps_original_whitespace() {
        let raw = json!("  [oops  ");
        assert_eq!(coerce_structured(&raw).value, raw);
    }

    #[test]
    fn scalars_are_not_structured_values() {
        assert_eq!(coerce_structured(&json!("5")).value, json!("5"));
        assert!(!coerce_structured(&json!("'text'")).ok);
        assert!(!coerce_structured(&json!(5)).ok);
    }

    #[test]
    fn blank_and_null_become_null() {
        for raw in [json!(null), json!(""), json!("   ")] {
            let out = coerce_structured(&raw);
            assert!(out.ok);
            assert_eq!(out.value, json!(null));
        }
    }

    #[test]
    fn native_structures_pass_through() {
        let raw = json!([{"id": 1}]);
        assert_eq!(coerce_structured(&raw).value, raw);
    }

    #[test]
    fn booleans_accept_only_the_four_spellings() {
        assert_eq!(coerce_boolean(&json!("True")), json!(true));
        assert_eq!(coerce_boolean(&json!("False")), json!(false));
        assert_eq!(coerce_boolean(&json!(true)), json!(true));
        assert_eq!(coerce_boolean(&json!(false)), json!(false));

        for other in [json!("true"), json!("1"), json!(1), json!(null), json!("")] {
            assert_eq!(coerce_boolean(&other), other);
        }
    }
}
