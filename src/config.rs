use serde::{Deserialize, Serialize};

/// Index settings configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Whether `compress()` turns raw postings into gamma-coded postings
    pub compression: bool,
    pub tokenizer_config: TokenizerConfig,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            compression: true,
            tokenizer_config: TokenizerConfig::default(),
        }
    }
}

impl IndexSettings {
    pub fn uncompressed() -> Self {
        Self {
            compression: false,
            ..Self::default()
        }
    }

    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }
}

/// Tokenizer configuration
///
/// Tokens keep their original casing unless `lowercase` is set. Ingestion and
/// query parsing always share one configuration, so either policy is
/// consistent; it only changes which queries match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
}

/// Batch ingestion configuration
#[derive(Clone, Debug)]
pub struct IndexerConfig {
    /// Log progress every this many documents
    pub progress_interval: usize,
    /// Number of pages fetched from a page store per batch
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            batch_size: 1000,
        }
    }
}
