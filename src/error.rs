use thiserror::Error;

/// Convenience result type for dataset loading.
pub type SourceResult<T> = Result<T, SourceReadError>;

/// Convenience result type for [`crate::store::DocumentStore`] operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned when the tabular source cannot be read.
///
/// Every variant is fatal for a pipeline run: without a dataset there is nothing to load.
#[derive(Debug, Error)]
pub enum SourceReadError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse error (unequal row lengths, invalid UTF-8, ...).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON / NDJSON parse error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is readable but does not have a usable tabular shape.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The source format could not be determined or is not supported.
    #[error("unsupported source format: {message}")]
    UnsupportedFormat { message: String },
}

/// Error returned by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or reached.
    #[error("document store unavailable: {message}")]
    Unavailable { message: String },

    /// The store refused a single document.
    #[error("document '{key}' rejected: {message}")]
    Rejected { key: String, message: String },

    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A document could not be serialized for storage.
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid or unreadable pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

/// Fatal error that stops a pipeline run before any document is submitted.
///
/// Per-record store failures are never reported here; they are counted in
/// [`crate::types::LoadOutcome`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read source: {0}")]
    Source(#[from] SourceReadError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
