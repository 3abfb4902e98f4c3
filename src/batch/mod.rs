//! Batch loading of normalized documents into a [`DocumentStore`].
//!
//! The loader submits documents one at a time, isolates per-document failures, and stops the run
//! once the number of failures exceeds [`BatchOptions::error_limit`]:
//!
//! - each failure is counted and recorded, then the next document is submitted
//! - after every document, `failed > error_limit` ends the run with
//!   [`Termination::Aborted`]; documents already stored stay stored
//! - otherwise the run ends [`Termination::Completed`]
//!
//! With [`BatchOptions::concurrency`] set, documents are submitted from a bounded worker pool.
//! The abort check then triggers within at most `max_in_flight` extra submissions, and failures
//! are still attributed to the right document even when submissions complete out of order.

mod observer;
mod semaphore;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::store::DocumentStore;
use crate::types::{AbortReason, Document, LoadOutcome, RecordFailure, Termination};

pub use observer::{LoadEvent, LoadMetrics, LoadMetricsSnapshot, LoadObserver, TracingLoadObserver};

use semaphore::Semaphore;

/// Settings for the bounded worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on concurrently executing `upsert` calls.
    pub max_in_flight: usize,
}

impl Default for ConcurrencyOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight: n,
        }
    }
}

/// Configuration for a [`BatchLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// The run aborts once more than this many documents have failed.
    pub error_limit: usize,
    /// Emit a [`LoadEvent::Progress`] every this many processed documents.
    pub progress_every: usize,
    /// Prefix of every document key.
    pub key_prefix: String,
    /// Field holding the natural identifier.
    pub id_field: String,
    /// `None` loads sequentially.
    pub concurrency: Option<ConcurrencyOptions>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            error_limit: 10,
            progress_every: 100,
            key_prefix: "movie_".to_string(),
            id_field: "id".to_string(),
            concurrency: None,
        }
    }
}

/// Key a document is stored under.
///
/// `prefix + id` when the document has a non-null `id_field`, else `prefix + index`. String ids
/// are used verbatim; other scalars use their JSON text.
///
/// Index-based keys are only as stable as the source's row order. Two documents with the same id
/// share a key, so the later one overwrites the earlier one.
pub fn document_key(document: &Document, index: usize, options: &BatchOptions) -> String {
    match document.get(&options.id_field) {
        None | Some(Value::Null) => format!("{}{index}", options.key_prefix),
        Some(Value::String(id)) => format!("{}{id}", options.key_prefix),
        Some(other) => format!("{}{other}", options.key_prefix),
    }
}

/// Drives documents into a [`DocumentStore`] under the error-tolerance policy.
pub struct BatchLoader {
    options: BatchOptions,
    observer: Option<Arc<dyn LoadObserver>>,
    metrics: Arc<LoadMetrics>,
}

impl BatchLoader {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            observer: None,
            metrics: Arc::new(LoadMetrics::new()),
        }
    }

    /// Attach an observer for load events (progress/logging).
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time load metrics.
    pub fn metrics(&self) -> Arc<LoadMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Submit every document to `store`, in order, and account for the result.
    ///
    /// Uses the worker pool when [`BatchOptions::concurrency`] is set.
    pub fn run<S, I>(&self, documents: I, store: &S) -> LoadOutcome
    where
        S: DocumentStore + ?Sized,
        I: IntoIterator<Item = Document>,
        I::IntoIter: ExactSizeIterator,
    {
        match self.options.concurrency.clone() {
            Some(conc) => self.run_concurrent(documents.into_iter().collect(), store, &conc),
            None => self.run_sequential(documents, store),
        }
    }

    /// Sequential run: each document is submitted and accounted for before the next one.
    pub fn run_sequential<S, I>(&self, documents: I, store: &S) -> LoadOutcome
    where
        S: DocumentStore + ?Sized,
        I: IntoIterator<Item = Document>,
        I::IntoIter: ExactSizeIterator,
    {
        let documents = documents.into_iter();
        let total = documents.len();
        let start = self.begin(total);
        let mut outcome = LoadOutcome::new(total);

        for (index, document) in documents.enumerate() {
            let key = document_key(&document, index, &self.options);
            self.metrics.on_submit_start();
            let result = store.upsert(&key, &document);
            self.metrics.on_submit_end(result.is_ok());

            match result {
                Ok(()) => outcome.record_success(),
                Err(err) => {
                    let error = err.to_string();
                    self.emit(LoadEvent::RecordFailed {
                        index,
                        key: key.clone(),
                        error: error.clone(),
                    });
                    outcome.record_failure(index, key, error);
                }
            }

            self.maybe_progress(outcome.processed(), total);

            if outcome.failed > self.options.error_limit {
                self.abort(&mut outcome);
                break;
            }
        }

        self.finish(outcome, start)
    }

    /// Concurrent run on a bounded worker pool.
    ///
    /// Falls back to [`Self::run_sequential`] if the pool cannot be built.
    pub fn run_concurrent<S>(&self, documents: Vec<Document>, store: &S, conc: &ConcurrencyOptions) -> LoadOutcome
    where
        S: DocumentStore + ?Sized,
    {
        let n_threads = conc
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);
        let pool = match ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|idx| format!("docload-{idx}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                warn!(%err, "failed to build worker pool; loading sequentially");
                return self.run_sequential(documents, store);
            }
        };

        let total = documents.len();
        let start = self.begin(total);

        let sem = Semaphore::new(conc.max_in_flight);
        let aborted = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let failures: Mutex<Vec<RecordFailure>> = Mutex::new(Vec::new());

        pool.install(|| {
            documents.into_par_iter().enumerate().for_each(|(index, document)| {
                if aborted.load(Ordering::SeqCst) {
                    return;
                }
                let permit = sem.acquire();
                if permit.waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited);
                }
                // Re-check: the limit may have been crossed while we waited.
                if aborted.load(Ordering::SeqCst) {
                    return;
                }

                let key = document_key(&document, index, &self.options);
                self.metrics.on_submit_start();
                let result = store.upsert(&key, &document);
                self.metrics.on_submit_end(result.is_ok());

                // The abort flag must be set before the permit is released.
                match result {
                    Ok(()) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => {
                        let error = err.to_string();
                        self.emit(LoadEvent::RecordFailed {
                            index,
                            key: key.clone(),
                            error: error.clone(),
                        });
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(RecordFailure { index, key, error });
                        let now_failed = failed.fetch_add(1, Ordering::SeqCst) + 1;
                        if now_failed > self.options.error_limit && !aborted.swap(true, Ordering::SeqCst) {
                            self.emit(LoadEvent::Aborted {
                                failed: now_failed,
                                error_limit: self.options.error_limit,
                            });
                        }
                    }
                }
                drop(permit);

                let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                self.maybe_progress(done, total);
            });
        });

        let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        failures.sort_by_key(|f| f.index);
        let succeeded = succeeded.into_inner();
        let failed = failed.into_inner();
        let outcome = LoadOutcome {
            total,
            attempted: succeeded + failed,
            succeeded,
            failed,
            failures,
            termination: if aborted.into_inner() {
                Termination::Aborted {
                    reason: AbortReason::TooManyErrors,
                }
            } else {
                Termination::Completed
            },
        };
        if outcome.is_aborted() {
            warn!(
                failed = outcome.failed,
                error_limit = self.options.error_limit,
                "too many errors; load stopped"
            );
        }
        self.finish(outcome, start)
    }

    fn begin(&self, total: usize) -> Instant {
        self.metrics.begin_run();
        self.emit(LoadEvent::RunStarted { total });
        Instant::now()
    }

    fn abort(&self, outcome: &mut LoadOutcome) {
        outcome.termination = Termination::Aborted {
            reason: AbortReason::TooManyErrors,
        };
        warn!(
            failed = outcome.failed,
            error_limit = self.options.error_limit,
            "too many errors; load stopped"
        );
        self.emit(LoadEvent::Aborted {
            failed: outcome.failed,
            error_limit: self.options.error_limit,
        });
    }

    fn maybe_progress(&self, processed: usize, total: usize) {
        let every = self.options.progress_every;
        if every > 0 && processed % every == 0 {
            self.emit(LoadEvent::Progress { processed, total });
        }
    }

    fn finish(&self, outcome: LoadOutcome, start: Instant) -> LoadOutcome {
        let elapsed = start.elapsed();
        self.metrics.end_run(elapsed);
        info!(
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "{outcome}"
        );
        self.emit(LoadEvent::RunFinished {
            termination: outcome.termination,
            elapsed,
            metrics: self.metrics.snapshot(),
        });
        outcome
    }

    fn emit(&self, event: LoadEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
