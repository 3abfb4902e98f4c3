use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreResult;
use crate::types::Document;

use super::DocumentStore;

/// In-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Document>>,
    upserts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> MutexGuard<'_, BTreeMap<String, Document>> {
        // A panicking writer cannot leave a half-inserted entry behind.
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Document stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Document> {
        self.docs().get(key).cloned()
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.docs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs().is_empty()
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.docs().keys().cloned().collect()
    }

    /// Copy of the full key/document map.
    pub fn snapshot(&self) -> BTreeMap<String, Document> {
        self.docs().clone()
    }

    /// Total successful `upsert` calls, including overwrites.
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryStore {
    fn upsert(&self, key: &str, document: &Document) -> StoreResult<()> {
        self.docs().insert(key.to_string(), document.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MemoryStore;
    use crate::store::DocumentStore;
    use crate::types::Document;

    fn doc(title: &str) -> Document {
        let mut d = Document::new();
        d.insert("title".to_string(), json!(title));
        d
    }

    #[test]
    fn upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        store.upsert("movie_1", &doc("first")).unwrap();
        store.upsert("movie_1", &doc("second")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.upsert_count(), 2);
        assert_eq!(store.get("movie_1").unwrap()["title"], json!("second"));
        assert!(store.get("movie_2").is_none());
    }
}
