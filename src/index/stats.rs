use serde::Serialize;

use super::postings::{IndexMode, PostingsTable};
use super::registry::DocumentRegistry;

/// Bytes an uncompressed posting occupies (one `u32` ordinal)
pub const RAW_POSTING_BYTES: u64 = 4;

/// Size and shape of an index
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexStats {
    pub mode: IndexMode,
    pub documents: usize,
    pub terms: usize,
    /// Sum of document frequencies over all terms
    pub postings: u64,
    /// Bytes the postings occupy in the current mode
    pub postings_bytes: u64,
    /// Bytes the postings would occupy as plain `u32` arrays
    pub raw_postings_bytes: u64,
}

impl IndexStats {
    pub fn collect(registry: &DocumentRegistry, postings: &PostingsTable) -> Self {
        let (total, bytes) = match postings {
            PostingsTable::Raw(terms) => {
                let total: u64 = terms.values().map(|set| set.len()).sum();
                (total, total * RAW_POSTING_BYTES)
            }
            PostingsTable::Compressed(terms) => terms.values().fold((0, 0), |(n, b), p| {
                (n + u64::from(p.doc_frequency), b + p.size_bytes() as u64)
            }),
        };

        Self {
            mode: postings.mode(),
            documents: registry.len(),
            terms: postings.len(),
            postings: total,
            postings_bytes: bytes,
            raw_postings_bytes: total * RAW_POSTING_BYTES,
        }
    }

    /// Raw size over current size; 1.0 for an empty or raw index
    pub fn compression_ratio(&self) -> f64 {
        if self.postings_bytes == 0 {
            1.0
        } else {
            self.raw_postings_bytes as f64 / self.postings_bytes as f64
        }
    }
}
