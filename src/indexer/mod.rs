//! Batch ingestion driver.

mod source;

pub use source::{from_pairs, DocumentSource, PageCursor};

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::{IndexSettings, IndexerConfig};
use crate::error::Result;
use crate::index::{IndexStats, InvertedIndex};
use crate::models::DocumentId;
use crate::persistence::PageStore;

/// Summary of one ingestion run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexingReport {
    /// Documents pulled from the source
    pub processed: usize,
    /// Documents that were new to the index
    pub indexed: usize,
    /// Time spent compressing, when compression ran
    pub compress_elapsed: Option<Duration>,
    pub elapsed: Duration,
}

/// Feeds documents into an [`InvertedIndex`] and compresses it afterwards
/// when the index settings ask for compression.
#[derive(Debug)]
pub struct Indexer {
    index: InvertedIndex,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(settings: IndexSettings, config: IndexerConfig) -> Self {
        Self::with_index(InvertedIndex::new(settings), config)
    }

    pub fn with_index(index: InvertedIndex, config: IndexerConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn into_index(self) -> InvertedIndex {
        self.index
    }

    /// Ingest every document of `source`, then compress if enabled
    ///
    /// Stops at the first source error; documents ingested before it stay
    /// in the index.
    pub fn process<S: DocumentSource>(&mut self, source: S) -> Result<IndexingReport> {
        let start = Instant::now();
        let mut report = IndexingReport::default();

        for doc in source {
            let doc = doc?;
            if self.index.add_document(&doc.id, &doc.text)? {
                report.indexed += 1;
            }
            report.processed += 1;
            if self.config.progress_interval > 0
                && report.processed % self.config.progress_interval == 0
            {
                info!(processed = report.processed, "indexing progress");
            }
        }

        if self.index.settings().compression && !self.index.postings().is_compressed() {
            let compress_start = Instant::now();
            self.index.compress()?;
            report.compress_elapsed = Some(compress_start.elapsed());
        }

        report.elapsed = start.elapsed();
        info!(
            processed = report.processed,
            indexed = report.indexed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "indexing completed"
        );
        Ok(report)
    }

    /// Ingest every page of `store`, batched per the indexer config
    pub fn process_store<P: PageStore + ?Sized>(&mut self, store: &P) -> Result<IndexingReport> {
        let cursor = PageCursor::new(store, self.config.batch_size);
        self.process(cursor)
    }

    pub fn search(&self, query: &str) -> Result<Vec<DocumentId>> {
        self.index.search(query)
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}
