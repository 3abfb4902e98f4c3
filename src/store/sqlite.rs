use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{StoreError, StoreResult};
use crate::types::Document;

use super::DocumentStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    key  TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL
);
";

const UPSERT: &str = "
INSERT INTO documents (key, body) VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET body = excluded.body
";

/// [`DocumentStore`] backed by a SQLite table of JSON bodies.
///
/// One connection is opened up front and shared behind a mutex; every upsert is its own
/// autocommit statement.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StoreError::Unavailable {
            message: format!("cannot open sqlite database {}: {e}", path.display()),
        })?;
        Self::from_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Unavailable {
            message: format!("cannot open in-memory sqlite database: {e}"),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA).map_err(|e| StoreError::Unavailable {
            message: format!("cannot initialise documents table: {e}"),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Document stored under `key`, if any.
    pub fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        let body: Option<String> = self
            .conn()
            .query_row("SELECT body FROM documents WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        match body {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Number of stored documents.
    pub fn count(&self) -> StoreResult<usize> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM documents ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl DocumentStore for SqliteStore {
    fn upsert(&self, key: &str, document: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(document)?;
        self.conn().execute(UPSERT, params![key, body])?;
        Ok(())
    }
}
