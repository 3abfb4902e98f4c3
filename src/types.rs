//! Core data model types for the load pipeline.
//!
//! A source is read into a [`Dataset`] of [`RawRow`]s, each row is normalized into a
//! [`Document`], and a batch run over those documents produces a [`LoadOutcome`].

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// A single raw cell as read from the source.
///
/// CSV cells are always strings (or numbers after scalar inference); JSON sources may carry any
/// JSON value.
pub type CellValue = Value;

/// One source line: column name to raw cell, in source column order.
pub type RawRow = Map<String, CellValue>;

/// A normalized row ready for submission to a [`crate::store::DocumentStore`].
pub type Document = Map<String, Value>;

/// In-memory tabular dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in source header order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<RawRow>,
}

impl Dataset {
    /// Create a dataset from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if `name` is one of the dataset's columns.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Why a batch run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The per-record failure count exceeded the configured error limit.
    TooManyErrors,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyErrors => f.write_str("too many errors"),
        }
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Termination {
    /// Every document was offered to the store.
    Completed,
    /// The run stopped before consuming every document.
    Aborted { reason: AbortReason },
}

/// A single document the store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// 0-based position of the document in the run input.
    pub index: usize,
    /// Key the document was submitted under.
    pub key: String,
    /// Store error message.
    pub error: String,
}

/// Per-run accounting for a batch load.
///
/// `attempted == succeeded + failed` always holds; `attempted < total` only when the run was
/// aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    /// Number of documents offered to the run.
    pub total: usize,
    /// Number of documents submitted to the store.
    pub attempted: usize,
    /// Number of successful upserts.
    pub succeeded: usize,
    /// Number of failed upserts.
    pub failed: usize,
    /// Failed documents, ordered by input index.
    pub failures: Vec<RecordFailure>,
    pub termination: Termination,
}

impl LoadOutcome {
    /// A fresh outcome for a run over `total` documents.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            termination: Termination::Completed,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub(crate) fn record_failure(&mut self, index: usize, key: String, error: String) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(RecordFailure { index, key, error });
    }

    /// Number of documents processed (successfully or not).
    pub fn processed(&self) -> usize {
        self.attempted
    }

    /// `true` if the run stopped because of the error limit.
    pub fn is_aborted(&self) -> bool {
        matches!(self.termination, Termination::Aborted { .. })
    }

    /// `true` if every document was stored without a single failure.
    pub fn is_clean(&self) -> bool {
        !self.is_aborted() && self.failed == 0
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.termination {
            Termination::Completed => f.write_str("completed")?,
            Termination::Aborted { reason } => write!(f, "aborted: {reason}")?,
        }
        write!(
            f,
            " (processed={}/{}, succeeded={}, failed={})",
            self.attempted, self.total, self.succeeded, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{AbortReason, LoadOutcome, Termination};

    #[test]
    fn outcome_counters_stay_consistent() {
        let mut outcome = LoadOutcome::new(3);
        outcome.record_success();
        outcome.record_failure(1, "movie_1".to_string(), "boom".to_string());

        assert_eq!(outcome.processed(), 2);
        assert_eq!(outcome.attempted, outcome.succeeded + outcome.failed);
        assert!(!outcome.is_clean());
        assert!(!outcome.is_aborted());
        assert_eq!(outcome.failures[0].key, "movie_1");
    }

    #[test]
    fn outcome_display_mentions_abort_reason() {
        let mut outcome = LoadOutcome::new(20);
        for i in 0..11 {
            outcome.record_failure(i, format!("movie_{i}"), "down".to_string());
        }
        outcome.termination = Termination::Aborted {
            reason: AbortReason::TooManyErrors,
        };

        assert_eq!(
            outcome.to_string(),
            "aborted: too many errors (processed=11/20, succeeded=0, failed=11)"
        );
    }
}
