//! Unified loading entrypoint.
//!
//! Most callers should use [`load_from_path`], which reads a whole source file into an in-memory
//! [`crate::types::Dataset`].
//!
//! - If [`LoaderOptions::format`] is `None`, the format is inferred from the file extension.
//! - The dataset shape (row count, columns) is always logged; if an
//!   [`super::observability::IngestionObserver`] is provided, success/failure/alerts are also
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SourceReadError, SourceResult};
use crate::missing::MissingMarkers;
use crate::types::Dataset;

use super::infer::{ScalarInference, infer_scalar_columns};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Delimited text with a header row.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling how a source is loaded.
///
/// Use [`Default`] for the common case: CSV with `,` delimiter (or JSON, by extension) and
/// per-column numeric inference.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<SourceFormat>,
    /// CSV field delimiter; must be a single ASCII character.
    pub delimiter: char,
    /// Numeric inference for CSV columns.
    pub inference: ScalarInference,
    /// Cells skipped by numeric inference.
    ///
    /// Should match the normalizer's markers; [`crate::pipeline::Pipeline`] keeps them in sync.
    pub missing: MissingMarkers,
    /// Optional observer for logging/alerts.
    #[serde(skip)]
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("format", &self.format)
            .field("delimiter", &self.delimiter)
            .field("inference", &self.inference)
            .field("missing", &self.missing)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: ',',
            inference: ScalarInference::default(),
            missing: MissingMarkers::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl LoaderOptions {
    /// The delimiter as a byte, if it is a single ASCII character.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.is_ascii().then_some(self.delimiter as u8)
    }
}

/// Load a whole source file into a [`Dataset`].
///
/// Any error is fatal for the caller: the pipeline cannot proceed without a dataset.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count and columns
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use movie_docload::ingestion::{load_from_path, LoaderOptions};
///
/// # fn main() -> Result<(), movie_docload::SourceReadError> {
/// let ds = load_from_path("movies_metadata.csv", &LoaderOptions::default())?;
/// println!("rows={} columns={:?}", ds.row_count(), ds.columns);
/// # Ok(())
/// # }
/// ```
pub fn load_from_path(path: impl AsRef<Path>, options: &LoaderOptions) -> SourceResult<Dataset> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format,
    };

    let result = load_format(path, format, options);

    match &result {
        Ok(ds) => {
            info!(
                path = %path.display(),
                rows = ds.row_count(),
                columns = ?ds.columns,
                "source loaded"
            );
            if let Some(obs) = options.observer.as_ref() {
                let stats = IngestionStats {
                    rows: ds.row_count(),
                    columns: ds.columns.clone(),
                };
                obs.on_success(&ctx, &stats);
            }
        }
        Err(e) => {
            if let Some(obs) = options.observer.as_ref() {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn load_format(path: &Path, format: SourceFormat, options: &LoaderOptions) -> SourceResult<Dataset> {
    match format {
        SourceFormat::Csv => {
            let delimiter = options
                .delimiter_byte()
                .ok_or_else(|| SourceReadError::UnsupportedFormat {
                    message: format!("csv delimiter {:?} is not a single ASCII character", options.delimiter),
                })?;
            let mut ds = csv::load_csv_from_path(path, delimiter)?;
            if options.inference == ScalarInference::PerColumn {
                infer_scalar_columns(&mut ds, &options.missing);
            }
            Ok(ds)
        }
        SourceFormat::Json => json::load_json_from_path(path),
    }
}

fn severity_for_error(e: &SourceReadError) -> IngestionSeverity {
    match e {
        SourceReadError::Io(_) => IngestionSeverity::Critical,
        SourceReadError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        SourceReadError::Json(err) if err.is_io() => IngestionSeverity::Critical,
        SourceReadError::Json(_) => IngestionSeverity::Error,
        SourceReadError::SchemaMismatch { .. } => IngestionSeverity::Error,
        SourceReadError::UnsupportedFormat { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> SourceResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SourceReadError::UnsupportedFormat {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| SourceReadError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::{LoaderOptions, SourceFormat, infer_format_from_path};
    use std::path::Path;

    #[test]
    fn formats_by_extension() {
        assert_eq!(SourceFormat::from_extension("CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("jsonl"), Some(SourceFormat::Json));
        assert_eq!(SourceFormat::from_extension("parquet"), None);
        assert!(infer_format_from_path(Path::new("movies")).is_err());
    }

    #[test]
    fn loader_options_deserialize_with_defaults() {
        let opts: LoaderOptions =
            serde_json::from_str(r#"{"format": "csv", "delimiter": ";", "inference": "off"}"#).unwrap();
        assert_eq!(opts.format, Some(SourceFormat::Csv));
        assert_eq!(opts.delimiter_byte(), Some(b';'));
        assert!(opts.observer.is_none());

        let wide = LoaderOptions {
            delimiter: '→',
            ..Default::default()
        };
        assert_eq!(wide.delimiter_byte(), None);
    }
}
