//! Load a movie metadata file into a document store.
//!
//! Exit codes:
//! - `0`: every document was submitted
//! - `1`: fatal error (bad config, unreadable source, store unreachable)
//! - `2`: the run stopped after too many failed documents
//!
//! Environment:
//! - RUST_LOG: log filter (default `info`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder};

use movie_docload::batch::TracingLoadObserver;
use movie_docload::config::PipelineConfig;
use movie_docload::ingestion::{SourceFormat, TracingObserver};
use movie_docload::pipeline::Pipeline;
use movie_docload::store::{StoreConfig, open_store};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for SourceFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Json => SourceFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "load-movies", about = "Normalize a movie dataset and upsert it into a document store")]
struct Cli {
    /// Source file (overrides `source` in the config file).
    source: Option<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store documents in this SQLite database instead of memory.
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Force the source format instead of inferring it from the extension.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Stop after more than this many failed documents.
    #[arg(long)]
    error_limit: Option<usize>,

    /// Log progress every N documents.
    #[arg(long)]
    progress_every: Option<usize>,

    /// Submit documents from a worker pool of this many threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Bound on concurrent submissions (implies a worker pool).
    #[arg(long)]
    max_in_flight: Option<usize>,
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {}", e))
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(source) = &cli.source {
        cfg.source = source.clone();
    }
    if let Some(path) = &cli.sqlite {
        cfg.store = StoreConfig::Sqlite { path: path.clone() };
    }
    if let Some(format) = cli.format {
        cfg.loader.format = Some(format.into());
    }
    if let Some(limit) = cli.error_limit {
        cfg.batch.error_limit = limit;
    }
    if let Some(every) = cli.progress_every {
        cfg.batch.progress_every = every;
    }
    if cli.threads.is_some() || cli.max_in_flight.is_some() {
        let mut conc = cfg.batch.concurrency.take().unwrap_or_default();
        if let Some(n) = cli.threads {
            conc.num_threads = Some(n);
        }
        if let Some(n) = cli.max_in_flight {
            conc.max_in_flight = n;
        }
        cfg.batch.concurrency = Some(conc);
    }

    cfg.loader.observer = Some(Arc::new(TracingObserver));
    cfg.validate()?;
    Ok(cfg)
}

fn run(cli: &Cli) -> Result<i32> {
    let cfg = build_config(cli)?;

    info!(store = ?cfg.store, "connecting to document store");
    let store = open_store(&cfg.store).context("opening document store")?;
    info!("document store ready");

    let report = Pipeline::new(cfg)
        .with_load_observer(Arc::new(TracingLoadObserver))
        .run(&*store)?;

    info!(
        rows = report.rows,
        succeeded = report.outcome.succeeded,
        failed = report.outcome.failed,
        "{}",
        report.outcome
    );
    Ok(report.status().exit_code())
}

/// Exit code for a command line clap rejected: `0` for `--help` / `--version`, `1` otherwise.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.exit_code() == 0 { 0 } else { 1 }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };
    if let Err(e) = init_tracing("info") {
        eprintln!("{e:#}");
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("load failed: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use clap::Parser;
    use movie_docload::store::StoreConfig;

    use super::{Cli, build_config, usage_exit_code};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn usage_errors_are_fatal_not_aborts() {
        let err = Cli::try_parse_from(["load-movies", "--bogus"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);

        let err = Cli::try_parse_from(["load-movies", "m.csv", "--error-limit", "abc"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);
    }

    #[test]
    fn help_exits_cleanly() {
        let err = Cli::try_parse_from(["load-movies", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 0);
    }

    #[test]
    fn max_in_flight_alone_enables_the_worker_pool() {
        let cfg = build_config(&parse(&["load-movies", "m.csv", "--max-in-flight", "3"])).unwrap();
        let conc = cfg.batch.concurrency.unwrap();
        assert_eq!(conc.max_in_flight, 3);
        assert!(conc.num_threads.is_some());
    }

    #[test]
    fn no_concurrency_flags_loads_sequentially() {
        let cfg = build_config(&parse(&["load-movies", "m.csv"])).unwrap();
        assert_eq!(cfg.source, PathBuf::from("m.csv"));
        assert!(cfg.batch.concurrency.is_none());
        assert_eq!(cfg.store, StoreConfig::Memory);
        assert!(cfg.loader.observer.is_some());
    }

    #[test]
    fn flags_override_the_config_file() {
        let path = std::env::temp_dir().join(format!("load_movies_{}_cli.json", std::process::id()));
        fs::write(
            &path,
            r#"{
                "source": "from_file.csv",
                "batch": {"error_limit": 3, "progress_every": 50},
                "store": {"kind": "sqlite", "path": "file.sqlite"}
            }"#,
        )
        .unwrap();
        let config = path.to_string_lossy().into_owned();

        let cfg = build_config(&parse(&[
            "load-movies",
            "--config",
            &config,
            "--error-limit",
            "5",
            "--sqlite",
            "cli.sqlite",
        ]))
        .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(cfg.source, PathBuf::from("from_file.csv"));
        assert_eq!(cfg.batch.error_limit, 5);
        assert_eq!(cfg.batch.progress_every, 50);
        assert_eq!(
            cfg.store,
            StoreConfig::Sqlite {
                path: PathBuf::from("cli.sqlite")
            }
        );
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        assert!(build_config(&parse(&["load-movies", "m.csv", "--progress-every", "0"])).is_err());
        assert!(build_config(&parse(&["load-movies"])).is_err());
    }
}
