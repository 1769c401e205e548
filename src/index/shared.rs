use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use super::inverted_index::InvertedIndex;
use super::stats::IndexStats;
use crate::error::Result;
use crate::models::DocumentId;

/// Thread-safe handle to an [`InvertedIndex`]
///
/// Ingestion and compression take the write lock; searches share the read
/// lock. Clones refer to the same index.
#[derive(Clone, Debug, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<InvertedIndex>>,
}

impl SharedIndex {
    pub fn new(index: InvertedIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn add_document(&self, id: &str, text: &str) -> Result<bool> {
        self.inner.write().add_document(id, text)
    }

    pub fn compress(&self) -> Result<()> {
        self.inner.write().compress()
    }

    pub fn search(&self, query: &str) -> Result<Vec<DocumentId>> {
        self.inner.read().search(query)
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.read().save(path)
    }

    /// Run `f` with shared access to the index
    pub fn with_index<T>(&self, f: impl FnOnce(&InvertedIndex) -> T) -> T {
        f(&self.inner.read())
    }
}
