use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use super::compressor::compress_terms;
use super::postings::{IndexMode, PostingsTable};
use super::query::Query;
use super::registry::DocumentRegistry;
use super::stats::IndexStats;
use crate::config::IndexSettings;
use crate::error::{IndexError, Result};
use crate::models::DocumentId;
use crate::persistence::IndexSnapshot;
use crate::tokenizer::Tokenizer;

/// Membership-only inverted index with optional gamma-coded postings
///
/// Documents are added while the index is raw. `compress()` converts the
/// postings once; after that the index answers queries and can be saved, but
/// admits no new documents.
#[derive(Clone, Debug)]
pub struct InvertedIndex {
    settings: IndexSettings,
    tokenizer: Tokenizer,
    registry: DocumentRegistry,
    postings: PostingsTable,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new(IndexSettings::default())
    }
}

impl InvertedIndex {
    pub fn new(settings: IndexSettings) -> Self {
        let tokenizer = Tokenizer::new(&settings.tokenizer_config);
        Self {
            settings,
            tokenizer,
            registry: DocumentRegistry::new(),
            postings: PostingsTable::new(),
        }
    }

    pub(crate) fn from_parts(
        settings: IndexSettings,
        registry: DocumentRegistry,
        postings: PostingsTable,
    ) -> Self {
        let tokenizer = Tokenizer::new(&settings.tokenizer_config);
        Self {
            settings,
            tokenizer,
            registry,
            postings,
        }
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn postings(&self) -> &PostingsTable {
        &self.postings
    }

    pub fn mode(&self) -> IndexMode {
        self.postings.mode()
    }

    /// Number of registered documents
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains_document(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Index `text` under the external id `id`
    ///
    /// Returns `false` without touching the index when `id` is already known.
    pub fn add_document(&mut self, id: &str, text: &str) -> Result<bool> {
        if self.registry.contains(id) {
            return Ok(false);
        }
        if self.postings.is_compressed() {
            return Err(IndexError::Sealed);
        }

        let ordinal = self.registry.register(id)?.ordinal();
        for term in self.tokenizer.unique_terms(text) {
            self.postings.insert(&term, ordinal)?;
        }
        Ok(true)
    }

    /// Replace raw postings with gamma-coded postings
    ///
    /// No-op when the index is already compressed or compression is disabled
    /// in its settings.
    pub fn compress(&mut self) -> Result<()> {
        if !self.settings.compression {
            debug!("compression disabled, keeping raw postings");
            return Ok(());
        }
        let PostingsTable::Raw(terms) = &self.postings else {
            debug!("postings already compressed");
            return Ok(());
        };

        let start = Instant::now();
        let compressed = compress_terms(terms)?;
        self.postings = PostingsTable::Compressed(compressed);
        info!(
            terms = self.postings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index compressed"
        );
        Ok(())
    }

    /// External ids of documents containing every term of `query`
    ///
    /// The order of the returned ids is unspecified.
    pub fn search(&self, query: &str) -> Result<Vec<DocumentId>> {
        let query = Query::parse(&self.tokenizer, query);
        let hits = query.execute(&self.postings, &self.registry)?;
        debug!(terms = ?query.terms(), hits = hits.len(), "search");
        Ok(hits)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats::collect(&self.registry, &self.postings)
    }

    /// Persist the full index state to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        IndexSnapshot::capture(self).save_to_path(path.as_ref())
    }

    /// Replace this index with the state persisted at `path`
    ///
    /// On error the index is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::open(path)?;
        Ok(())
    }

    /// Open an index persisted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        IndexSnapshot::load_from_path(path.as_ref())?.restore()
    }

    /// Write the full index state to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        IndexSnapshot::capture(self).write_to(writer)
    }

    /// Read an index previously written with [`InvertedIndex::write_to`]
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        IndexSnapshot::read_from(reader)?.restore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::query::id_set;
    use std::collections::HashSet;

    const DOCS: [(&str, &str); 4] = [
        ("doc1", "Rector SPBU announced new rules"),
        ("doc2", "At MSU a rector meeting took place"),
        ("doc3", "SPBU and MSU cooperate in science"),
        ("doc4", "Rector SPBU met with rector MSU"),
    ];

    fn build(settings: IndexSettings) -> InvertedIndex {
        let mut index = InvertedIndex::new(settings);
        for (id, text) in DOCS {
            assert!(index.add_document(id, text).unwrap());
        }
        index
    }

    #[test]
    fn test_add_document() {
        let index = build(IndexSettings::uncompressed());
        assert_eq!(index.len(), 4);
        assert_eq!(index.postings().doc_frequency("SPBU"), Some(3));
        assert_eq!(index.postings().doc_frequency("rector"), Some(2));
        assert_eq!(index.postings().doc_frequency("Rector"), Some(2));
    }

    #[test]
    fn test_search_before_and_after_compression() {
        let mut index = build(IndexSettings::default());
        let expected = HashSet::from(["doc1", "doc4"]);

        let before = index.search("Rector SPBU").unwrap();
        assert_eq!(id_set(&before), expected);

        index.compress().unwrap();
        assert_eq!(index.mode(), IndexMode::Compressed);

        let after = index.search("Rector SPBU").unwrap();
        assert_eq!(id_set(&after), expected);
    }

    #[test]
    fn test_duplicate_id_is_noop() {
        let mut index = InvertedIndex::default();
        assert!(index.add_document("doc1", "alpha beta").unwrap());
        assert!(!index.add_document("doc1", "gamma delta").unwrap());

        assert_eq!(index.len(), 1);
        assert_eq!(index.postings().len(), 2);
        assert!(index.search("gamma").unwrap().is_empty());
        assert_eq!(index.search("alpha").unwrap(), vec!["doc1".to_string()]);
    }

    #[test]
    fn test_repeated_tokens_count_once() {
        let mut index = InvertedIndex::default();
        index.add_document("doc1", "echo echo echo").unwrap();
        assert_eq!(index.postings().doc_frequency("echo"), Some(1));
    }

    #[test]
    fn test_empty_query() {
        let index = build(IndexSettings::default());
        assert!(index.search("").unwrap().is_empty());
        assert!(index.search("?!").unwrap().is_empty());
    }

    #[test]
    fn test_compressed_index_is_sealed() {
        let mut index = build(IndexSettings::default());
        index.compress().unwrap();

        let err = index.add_document("doc5", "late arrival").unwrap_err();
        assert!(matches!(err, IndexError::Sealed));
        // Known ids stay a no-op
        assert!(!index.add_document("doc1", "anything").unwrap());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_compress_twice_is_noop() {
        let mut index = build(IndexSettings::default());
        index.compress().unwrap();
        let stats = index.stats();
        index.compress().unwrap();
        assert_eq!(index.stats(), stats);
    }

    #[test]
    fn test_compress_disabled_keeps_raw() {
        let mut index = build(IndexSettings::uncompressed());
        index.compress().unwrap();
        assert_eq!(index.mode(), IndexMode::Raw);
        assert!(index.add_document("doc5", "still open").unwrap());
    }

    #[test]
    fn test_lowercase_matches_across_case() {
        let mut settings = IndexSettings::default();
        settings.tokenizer_config.lowercase = true;
        let index = build(settings);

        let hits = index.search("RECTOR msu").unwrap();
        assert_eq!(id_set(&hits), HashSet::from(["doc2", "doc4"]));
    }

    #[test]
    fn test_stream_roundtrip() {
        let mut index = build(IndexSettings::default());
        index.compress().unwrap();

        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        let restored = InvertedIndex::read_from(&mut buf.as_slice()).unwrap();

        assert_eq!(restored.len(), 4);
        assert_eq!(restored.mode(), IndexMode::Compressed);
        assert_eq!(
            id_set(&restored.search("SPBU MSU").unwrap()),
            HashSet::from(["doc3", "doc4"])
        );
    }
}
