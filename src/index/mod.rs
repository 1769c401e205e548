//! In-memory inverted index
//!
//! # Architecture
//!
//! - `DocumentRegistry`: external document ids to dense ordinals
//! - `PostingsTable`: term to ordinal set, raw or gamma-coded
//! - `compressor`: one-shot raw to compressed transition
//! - `Query`: conjunctive query resolution over either representation
//! - `InvertedIndex`: ties the above together and persists via snapshots
//! - `SharedIndex`: lock-guarded handle for multi-threaded callers

pub mod compressor;
mod inverted_index;
mod postings;
mod query;
mod registry;
mod shared;
mod stats;

pub use inverted_index::InvertedIndex;
pub use postings::{CompressedPostings, IndexMode, PostingsTable};
pub use query::{id_set, Query};
pub use registry::{DocumentRegistry, Registration};
pub use shared::SharedIndex;
pub use stats::{IndexStats, RAW_POSTING_BYTES};
