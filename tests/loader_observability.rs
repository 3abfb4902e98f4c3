use std::fs;
use std::sync::{Arc, Mutex};

use movie_docload::SourceReadError;
use movie_docload::ingestion::{
    IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, LoaderOptions, SourceFormat,
    load_from_path,
};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: &IngestionStats) {
        self.successes.lock().unwrap().push(stats.clone());
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &SourceReadError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &SourceReadError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn observer_receives_failure_and_alert_on_missing_file() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = LoaderOptions {
        format: Some(SourceFormat::Csv),
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    let _ = load_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
}

#[test]
fn malformed_source_is_an_error_without_alert() {
    let path = std::env::temp_dir().join(format!("movie_docload_{}_obs_dupe.csv", std::process::id()));
    fs::write(&path, "id,id\n1,2\n").unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let opts = LoaderOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };
    let _ = load_from_path(&path, &opts).unwrap_err();
    fs::remove_file(&path).ok();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_errors_too() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = LoaderOptions {
        format: Some(SourceFormat::Json),
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Error,
        ..Default::default()
    };
    let _ = load_from_path("tests/fixtures/movies.csv", &opts).unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Error]);
}

#[test]
fn observer_sees_dataset_shape_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = LoaderOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };
    load_from_path("tests/fixtures/movies.csv", &opts).unwrap();

    let successes = obs.successes.lock().unwrap();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].rows, 5);
    assert_eq!(successes[0].columns.first().map(String::as_str), Some("adult"));
    assert!(obs.failures.lock().unwrap().is_empty());
}
