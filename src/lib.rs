//! `movie-docload` turns a movie metadata CSV into JSON documents and upserts them into a
//! document store.
//!
//! The export this crate was built for stores nested data as Python reprs inside CSV cells
//! (`"[{'id': 16, 'name': 'Animation'}]"`) and spells booleans `True` / `False`. Loading it
//! takes four steps:
//!
//! 1. [`ingestion`]: read the whole source into a [`types::Dataset`] (CSV, JSON or NDJSON)
//! 2. [`normalize`]: turn each row into a [`types::Document`]; the structured and boolean columns
//!    go through [`coerce`] and every missing marker becomes `null`
//! 3. [`batch`]: upsert each document under `movie_<id>` with per-record failure isolation and an
//!    error limit
//! 4. [`store`]: the [`store::DocumentStore`] the documents land in
//!
//! [`pipeline::Pipeline`] wires these together from a [`config::PipelineConfig`].
//!
//! ## Failure policy
//!
//! - A cell that fails to parse keeps its raw value. This never fails the row.
//! - A document the store rejects is counted and skipped.
//! - Once more than [`batch::BatchOptions::error_limit`] documents have failed, the run stops
//!   with [`types::Termination::Aborted`]. Documents already stored stay stored.
//! - Only an unreadable source, an unreachable store or an invalid config is an `Err`.
//!
//! ## Example
//!
//! ```rust
//! use movie_docload::batch::{BatchLoader, BatchOptions};
//! use movie_docload::normalize::{normalize, NormalizerConfig};
//! use movie_docload::store::MemoryStore;
//! use serde_json::json;
//!
//! let columns = vec!["id".to_string(), "genres".to_string(), "adult".to_string()];
//! let row = json!({"id": 862, "genres": "[{'id': 16, 'name': 'Animation'}]", "adult": "False"});
//! let doc = normalize(row.as_object().unwrap(), &columns, &NormalizerConfig::default());
//!
//! let store = MemoryStore::new();
//! let outcome = BatchLoader::new(BatchOptions::default()).run(vec![doc], &store);
//!
//! assert!(outcome.is_clean());
//! let stored = store.get("movie_862").unwrap();
//! assert_eq!(stored["genres"], json!([{"id": 16, "name": "Animation"}]));
//! assert_eq!(stored["adult"], json!(false));
//! ```
//!
//! ## Modules
//!
//! - [`coerce`]: single-cell coercion (strategy chain, Python literal parser)
//! - [`missing`]: the missing-value predicate
//! - [`normalize`]: row normalization
//! - [`ingestion`]: dataset loading
//! - [`batch`]: batch loading, events and metrics
//! - [`store`]: document stores
//! - [`config`], [`pipeline`]: configuration and entry point
//! - [`error`]: error types

pub mod batch;
pub mod coerce;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod missing;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod types;

pub use error::{ConfigError, PipelineError, SourceReadError, SourceResult, StoreError, StoreResult};
