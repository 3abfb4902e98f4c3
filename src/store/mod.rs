//! Document store collaborators.
//!
//! The load pipeline only needs one operation, [`DocumentStore::upsert`]. Connection setup,
//! authentication and retries are the store's own business.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: a mutex-guarded map, handy for tests and dry runs
//! - [`SqliteStore`]: a single `documents(key, body)` table in a SQLite file

mod memory;
mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::types::Document;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A key/document store with insert-or-replace semantics.
///
/// Implementations must be safe to share across worker threads; each `upsert` is committed on its
/// own, with no multi-document atomicity.
pub trait DocumentStore: Send + Sync {
    /// Insert `document` under `key`, replacing any existing document (last write wins).
    fn upsert(&self, key: &str, document: &Document) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn upsert(&self, key: &str, document: &Document) -> StoreResult<()> {
        (**self).upsert(key, document)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn upsert(&self, key: &str, document: &Document) -> StoreResult<()> {
        (**self).upsert(key, document)
    }
}

/// Which store the `load-movies` binary opens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Keep documents in memory for the duration of the run.
    #[default]
    Memory,
    /// Persist documents to a SQLite database file.
    Sqlite { path: PathBuf },
}

/// Open the store described by `config`.
///
/// Fails with [`crate::error::StoreError::Unavailable`] if the store cannot be reached; this is a
/// fatal startup error.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    Ok(match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Sqlite { path } => Arc::new(SqliteStore::open(path)?),
    })
}
