//! Raw to compressed postings transition
//!
//! Per term: ascending ordinals, delta-coded (first value kept, then
//! successor gaps), each delta gamma-coded and concatenated.

use std::collections::HashMap;

use roaring::RoaringBitmap;
use tracing::debug;

use super::postings::CompressedPostings;
use crate::codec::{gamma, BitWriter};
use crate::error::{IndexError, Result};

/// Gaps between successive values of an ascending sequence
///
/// The first value is kept as is. Every gap of a strictly increasing
/// sequence of positive values is at least 1.
pub fn delta_encode<I>(sorted: I) -> impl Iterator<Item = u32>
where
    I: IntoIterator<Item = u32>,
{
    sorted.into_iter().scan(0u32, |prev, value| {
        let delta = value.wrapping_sub(*prev);
        *prev = value;
        Some(delta)
    })
}

/// Compress one ordinal set
pub fn compress_set(set: &RoaringBitmap) -> Result<CompressedPostings> {
    let doc_frequency = u32::try_from(set.len()).map_err(|_| {
        IndexError::Corrupt(format!("postings set of {} ordinals is too large", set.len()))
    })?;

    // At least one bit per delta
    let mut out = BitWriter::with_capacity_bits(doc_frequency as usize);
    for delta in delta_encode(set.iter()) {
        gamma::encode(delta, &mut out)?;
    }

    Ok(CompressedPostings {
        doc_frequency,
        bit_len: out.bit_len(),
        bytes: out.into_bytes(),
    })
}

/// Compress every term of a raw table
pub fn compress_terms(
    terms: &HashMap<String, RoaringBitmap>,
) -> Result<HashMap<String, CompressedPostings>> {
    let mut compressed = HashMap::with_capacity(terms.len());
    for (term, set) in terms {
        if set.is_empty() {
            continue;
        }
        compressed.insert(term.clone(), compress_set(set)?);
    }
    debug!(terms = compressed.len(), "compressed postings table");
    Ok(compressed)
}
