use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::types::Termination;

/// Events emitted by a [`super::BatchLoader`] run.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    RunStarted { total: usize },
    /// Emitted every `progress_every` processed documents.
    Progress { processed: usize, total: usize },
    RecordFailed { index: usize, key: String, error: String },
    /// The error limit was exceeded; no further documents will be submitted.
    Aborted { failed: usize, error_limit: usize },
    RunFinished {
        termination: Termination,
        elapsed: Duration,
        metrics: LoadMetricsSnapshot,
    },
}

/// Observer hook for batch load events.
///
/// Events are informational; they never change the outcome of a run. Under concurrent loading,
/// events may arrive from several worker threads.
pub trait LoadObserver: Send + Sync {
    fn on_event(&self, event: &LoadEvent);
}

/// Logs batch progress and failures through `tracing`.
#[derive(Debug, Default)]
pub struct TracingLoadObserver;

impl LoadObserver for TracingLoadObserver {
    fn on_event(&self, event: &LoadEvent) {
        match event {
            LoadEvent::RunStarted { total } => info!(total, "starting document load"),
            LoadEvent::Progress { processed, total } => {
                let pct = if *total == 0 {
                    100.0
                } else {
                    *processed as f64 / *total as f64 * 100.0
                };
                info!("processed: {processed}/{total} ({pct:.2}%)");
            }
            LoadEvent::RecordFailed { key, error, .. } => {
                warn!(%key, %error, "error inserting document")
            }
            LoadEvent::Aborted { failed, error_limit } => {
                warn!(failed, error_limit, "too many errors; stopping load")
            }
            LoadEvent::RunFinished {
                termination,
                elapsed,
                metrics,
            } => info!(?termination, ?elapsed, "load finished: {metrics}"),
        }
    }
}

/// Real-time counters for a batch run.
///
/// The loader updates these during execution; callers can snapshot them at any time.
pub struct LoadMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    throttle_wait_ns: AtomicU64,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.attempted.store(0, Ordering::SeqCst);
        self.succeeded.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(duration_ns(elapsed), Ordering::SeqCst);
    }

    pub(crate) fn on_submit_start(&self) {
        self.attempted.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_submit_end(&self, ok: bool) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if ok {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        self.throttle_wait_ns.fetch_add(duration_ns(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> LoadMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        LoadMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            attempted: self.attempted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
        }
    }
}

impl Default for LoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ns(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Immutable snapshot of [`LoadMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub throttle_wait: Duration,
    pub max_in_flight: usize,
}

impl fmt::Display for LoadMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, attempted={}, succeeded={}, failed={}, max_in_flight={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.attempted,
            self.succeeded,
            self.failed,
            self.max_in_flight,
            self.throttle_wait,
            self.elapsed
        )
    }
}
