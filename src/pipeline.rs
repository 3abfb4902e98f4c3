//! End-to-end pipeline: load the source, normalize each row, batch-load into a store.
//!
//! ```no_run
//! use movie_docload::config::PipelineConfig;
//! use movie_docload::pipeline::Pipeline;
//! use movie_docload::store::MemoryStore;
//!
//! # fn main() -> Result<(), movie_docload::PipelineError> {
//! let store = MemoryStore::new();
//! let report = Pipeline::new(PipelineConfig::for_source("movies_metadata.csv")).run(&store)?;
//! println!("{}", report.outcome);
//! std::process::exit(report.status().exit_code());
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::batch::{BatchLoader, LoadObserver};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ingestion::load_from_path;
use crate::normalize::normalize_dataset;
use crate::store::DocumentStore;
use crate::types::{Dataset, LoadOutcome};

/// How a run that got past startup ended.
///
/// Fatal startup errors are reported as [`PipelineError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every document was submitted (some may still have failed, within the error limit).
    Completed,
    /// The error limit was exceeded and the run stopped early.
    Aborted,
}

impl PipelineStatus {
    /// Process exit code: `0` completed, `2` completed with abort.
    ///
    /// `1` is left for fatal errors.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Aborted => 2,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Source columns in header order.
    pub columns: Vec<String>,
    /// Number of rows read from the source.
    pub rows: usize,
    pub outcome: LoadOutcome,
}

impl PipelineReport {
    pub fn status(&self) -> PipelineStatus {
        if self.outcome.is_aborted() {
            PipelineStatus::Aborted
        } else {
            PipelineStatus::Completed
        }
    }
}

/// A configured pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    observer: Option<Arc<dyn LoadObserver>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach an observer for batch load events.
    pub fn with_load_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the config, load the source, then load every row into `store`.
    ///
    /// The store must already be open; opening it is the caller's startup step.
    pub fn run<S: DocumentStore + ?Sized>(&self, store: &S) -> Result<PipelineReport, PipelineError> {
        self.config.validate()?;

        let mut loader = self.config.loader.clone();
        loader.missing = self.config.normalizer.missing.clone();
        let dataset = load_from_path(&self.config.source, &loader)?;

        Ok(self.run_dataset(&dataset, store))
    }

    /// Normalize and load an already-loaded dataset.
    pub fn run_dataset<S: DocumentStore + ?Sized>(&self, dataset: &Dataset, store: &S) -> PipelineReport {
        info!(rows = dataset.row_count(), columns = dataset.columns.len(), "normalizing and loading");

        let mut batch = BatchLoader::new(self.config.batch.clone());
        if let Some(obs) = &self.observer {
            batch = batch.with_observer(Arc::clone(obs));
        }
        let documents = normalize_dataset(dataset, &self.config.normalizer);
        let outcome = batch.run(documents, store);

        PipelineReport {
            columns: dataset.columns.clone(),
            rows: dataset.row_count(),
            outcome,
        }
    }
}

/// Run `config` against `store` with no observer attached.
pub fn run_pipeline<S: DocumentStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
) -> Result<PipelineReport, PipelineError> {
    Pipeline::new(config.clone()).run(store)
}
