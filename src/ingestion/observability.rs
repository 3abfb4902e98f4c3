use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::error::SourceReadError;

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (load failed on the source's contents).
    Error,
    /// Critical error (I/O or other infrastructure failures).
    Critical,
}

/// Context about a load attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The source path.
    pub path: PathBuf,
    /// Format used for loading.
    pub format: SourceFormat,
}

/// Dataset shape reported on a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of loaded rows.
    pub rows: usize,
    /// Column names in source order.
    pub columns: Vec<String>,
}

/// Observer interface for load outcomes.
///
/// Purely informational: nothing an observer does changes the load result.
pub trait IngestionObserver: Send + Sync {
    /// Called when the source was loaded.
    fn on_success(&self, _ctx: &IngestionContext, _stats: &IngestionStats) {}

    /// Called when loading failed.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &SourceReadError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &SourceReadError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Logs load events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        debug!(
            format = ?ctx.format,
            path = %ctx.path.display(),
            rows = stats.rows,
            columns = ?stats.columns,
            "dataset loaded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &SourceReadError) {
        warn!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "dataset load failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &SourceReadError) {
        error!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            %error,
            "ALERT: dataset load failed"
        );
    }
}
