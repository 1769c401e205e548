//! Crawled page storage
//!
//! A key-unique page table: URLs are unique, keys are assigned densely from 1
//! in insertion order, and inserting a known URL is silently ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fjall::{Database, Keyspace, KeyspaceCreateOptions, PersistMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::blob_log::{BlobLog, BlobPointer};
use crate::error::{IndexError, Result};
use crate::models::{Page, PageKey};

/// Read/write contract of a page store
pub trait PageStore {
    /// Store a page; a URL that is already stored is ignored
    fn insert(&mut self, url: &str, text: &str) -> Result<()>;

    /// URLs of the given keys, in request order; unknown keys are skipped
    fn lookup_many(&self, keys: &[PageKey]) -> Result<Vec<String>>;

    /// Up to `limit` pages starting at the `offset`-th page in key order
    fn scan(&self, offset: usize, limit: usize) -> Result<Vec<Page>>;

    /// Number of stored pages
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slot(key: PageKey) -> Option<usize> {
    usize::try_from(key).ok()?.checked_sub(1)
}

/// In-memory page store
#[derive(Clone, Debug, Default)]
pub struct MemoryPageStore {
    pages: Vec<Page>,
    keys_by_url: HashMap<String, PageKey>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_of(&self, url: &str) -> Option<PageKey> {
        self.keys_by_url.get(url).copied()
    }
}

impl PageStore for MemoryPageStore {
    fn insert(&mut self, url: &str, text: &str) -> Result<()> {
        if self.keys_by_url.contains_key(url) {
            return Ok(());
        }
        let key = self.pages.len() as PageKey + 1;
        self.pages.push(Page {
            key,
            url: url.to_string(),
            text: text.to_string(),
        });
        self.keys_by_url.insert(url.to_string(), key);
        Ok(())
    }

    fn lookup_many(&self, keys: &[PageKey]) -> Result<Vec<String>> {
        Ok(keys
            .iter()
            .filter_map(|&key| self.pages.get(slot(key)?))
            .map(|page| page.url.clone())
            .collect())
    }

    fn scan(&self, offset: usize, limit: usize) -> Result<Vec<Page>> {
        Ok(self.pages.iter().skip(offset).take(limit).cloned().collect())
    }

    fn len(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Serialize, Deserialize)]
struct PageRecord {
    url: String,
    text: String,
}

/// Pointer plus URL stored in fjall for a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PagePointer {
    blob: BlobPointer,
    url: String,
}

const POINTER_CF: &str = "page_ptr";
const URL_CF: &str = "page_url";
const META_CF: &str = "page_meta";
const PAGE_COUNT_KEY: &[u8] = b"page_count";

fn store_error(e: impl std::fmt::Display) -> IndexError {
    IndexError::PageStore(e.to_string())
}

fn decode_key(val: &[u8]) -> Result<PageKey> {
    let bytes: [u8; 8] = val
        .try_into()
        .map_err(|_| IndexError::Corrupt(format!("page key of {} bytes", val.len())))?;
    Ok(PageKey::from_be_bytes(bytes))
}

/// Fjall-indexed page store over an append-only blob log
///
/// Page texts live in the blob log. Fjall keyspaces map page keys to blob
/// pointers and URLs to page keys, so opening the store reads no page
/// payloads.
pub struct LogPageStore {
    base_dir: PathBuf,
    db: Database,
    pointers: Keyspace,
    keys_by_url: Keyspace,
    meta: Keyspace,
    log: BlobLog,
    len: u64,
}

impl LogPageStore {
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        let db = Database::builder(base_dir.join("index"))
            .open()
            .map_err(|e| IndexError::PageStore(format!("failed to open page index: {}", e)))?;

        let pointers = db
            .keyspace(POINTER_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| IndexError::PageStore(format!("failed to open page_ptr cf: {}", e)))?;
        let keys_by_url = db
            .keyspace(URL_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| IndexError::PageStore(format!("failed to open page_url cf: {}", e)))?;
        let meta = db
            .keyspace(META_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| IndexError::PageStore(format!("failed to open page_meta cf: {}", e)))?;

        let log = BlobLog::open(base_dir.join("pages.blob"))?;

        let mut store = Self {
            base_dir,
            db,
            pointers,
            keys_by_url,
            meta,
            log,
            len: 0,
        };
        store.len = store.stored_count()?;
        if store.len == 0 && !store.log.is_empty()? {
            store.reindex()?;
        }

        info!(pages = store.len, path = ?store.base_dir, "page store opened");
        Ok(store)
    }

    pub fn key_of(&self, url: &str) -> Result<Option<PageKey>> {
        self.keys_by_url
            .get(url.as_bytes())
            .map_err(store_error)?
            .map(|val| decode_key(val.as_ref()))
            .transpose()
    }

    /// Flush the page index journal to disk.
    pub fn persist(&self) -> Result<()> {
        self.db.persist(PersistMode::SyncAll).map_err(store_error)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn stored_count(&self) -> Result<u64> {
        match self.meta.get(PAGE_COUNT_KEY).map_err(store_error)? {
            Some(val) => decode_key(val.as_ref()),
            None => Ok(0),
        }
    }

    /// Rebuild the page index from the blob log after the index was lost.
    fn reindex(&mut self) -> Result<()> {
        warn!(path = ?self.log.path(), "page index is empty, rebuilding from blob log");
        for (blob, payload) in self.log.scan()? {
            let record: PageRecord = bincode::deserialize(&payload)?;
            if self.key_of(&record.url)?.is_none() {
                self.index_page(blob, record.url)?;
            }
        }
        Ok(())
    }

    fn index_page(&mut self, blob: BlobPointer, url: String) -> Result<()> {
        let key = self.len + 1;
        let key_bytes = key.to_be_bytes();
        self.keys_by_url
            .insert(url.as_bytes(), key_bytes)
            .map_err(store_error)?;
        let ptr = bincode::serialize(&PagePointer { blob, url })?;
        self.pointers.insert(key_bytes, ptr).map_err(store_error)?;
        self.meta
            .insert(PAGE_COUNT_KEY, key_bytes)
            .map_err(store_error)?;
        self.len = key;
        Ok(())
    }

    fn pointer(&self, key: PageKey) -> Result<Option<PagePointer>> {
        let Some(val) = self.pointers.get(key.to_be_bytes()).map_err(store_error)? else {
            return Ok(None);
        };
        Ok(Some(bincode::deserialize(val.as_ref())?))
    }

    fn read_page(&self, key: PageKey) -> Result<Page> {
        let ptr = self
            .pointer(key)?
            .ok_or_else(|| IndexError::PageStore(format!("no page with key {}", key)))?;
        let record: PageRecord = bincode::deserialize(&self.log.read(ptr.blob)?)?;
        Ok(Page {
            key,
            url: record.url,
            text: record.text,
        })
    }
}

impl Drop for LogPageStore {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to persist page index on close");
        }
    }
}

impl PageStore for LogPageStore {
    fn insert(&mut self, url: &str, text: &str) -> Result<()> {
        if self.key_of(url)?.is_some() {
            debug!(url, "page already stored");
            return Ok(());
        }
        let record = PageRecord {
            url: url.to_string(),
            text: text.to_string(),
        };
        let blob = self.log.append(&bincode::serialize(&record)?)?;
        self.index_page(blob, record.url)
    }

    fn lookup_many(&self, keys: &[PageKey]) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(keys.len());
        for &key in keys {
            if key == 0 || key > self.len {
                continue;
            }
            if let Some(ptr) = self.pointer(key)? {
                urls.push(ptr.url);
            }
        }
        Ok(urls)
    }

    fn scan(&self, offset: usize, limit: usize) -> Result<Vec<Page>> {
        let start = offset as u64 + 1;
        let end = start.saturating_add(limit as u64).min(self.len + 1);
        (start..end).map(|key| self.read_page(key)).collect()
    }

    fn len(&self) -> usize {
        self.len as usize
    }
}
