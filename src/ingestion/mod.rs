//! Dataset loading.
//!
//! Most callers should use [`load_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`LoaderOptions`])
//! - reads the whole source into an in-memory [`crate::types::Dataset`]
//! - optionally converts numeric-looking CSV columns ([`ScalarInference`])
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod infer;
pub mod json;
pub mod observability;
pub mod unified;

pub use infer::{ScalarInference, infer_scalar_columns};
pub use observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver};
pub use unified::{LoaderOptions, SourceFormat, load_from_path};
