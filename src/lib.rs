pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod models;
pub mod persistence;
pub mod tokenizer;

pub use config::{IndexSettings, IndexerConfig, TokenizerConfig};
pub use error::{IndexError, Result};
pub use index::{IndexMode, IndexStats, InvertedIndex, Query, SharedIndex};
pub use indexer::{DocumentSource, Indexer, IndexingReport, PageCursor};
pub use models::*;
pub use persistence::{LogPageStore, MemoryPageStore, PageStore};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
