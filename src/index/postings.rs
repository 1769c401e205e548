//! Postings table
//!
//! Either every term maps to a raw ordinal set, or every term maps to a
//! gamma-coded delta stream. The variant is the index mode; a table never
//! mixes the two.

use std::borrow::Cow;
use std::collections::HashMap;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::codec::{render_bits, GammaDecoder};
use crate::error::{IndexError, Result};
use crate::models::Ordinal;

/// Which representation the postings table currently holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    Raw,
    Compressed,
}

/// Gamma-coded, delta-encoded ordinal set of one term
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedPostings {
    /// Number of ordinals encoded
    pub doc_frequency: u32,
    /// Logical bits in `bytes` (the last byte is zero-padded)
    pub bit_len: u64,
    pub bytes: Vec<u8>,
}

impl CompressedPostings {
    /// Ordinals in ascending order, rebuilt by prefix sums over the deltas
    ///
    /// Stops early if a sum would overflow `u32`.
    pub fn ordinals(&self) -> impl Iterator<Item = u32> + '_ {
        GammaDecoder::new(&self.bytes, self.bit_len).scan(0u32, |acc, delta| {
            *acc = acc.checked_add(delta)?;
            Some(*acc)
        })
    }

    /// Decode into an ordinal set
    ///
    /// Fails when the stream does not hold exactly `doc_frequency` ordinals.
    pub fn decode(&self) -> Result<RoaringBitmap> {
        let mut set = RoaringBitmap::new();
        let mut count = 0u64;
        for ordinal in self.ordinals() {
            set.insert(ordinal);
            count += 1;
        }
        if count != u64::from(self.doc_frequency) {
            return Err(IndexError::Corrupt(format!(
                "postings decoded to {} ordinals, expected {}",
                count, self.doc_frequency
            )));
        }
        Ok(set)
    }

    /// Encoded size in bytes
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// The encoded stream as `'0'`/`'1'` symbols
    pub fn to_symbols(&self) -> String {
        render_bits(&self.bytes, self.bit_len)
    }
}

/// Term to postings mapping
#[derive(Clone, Debug)]
pub enum PostingsTable {
    Raw(HashMap<String, RoaringBitmap>),
    Compressed(HashMap<String, CompressedPostings>),
}

impl Default for PostingsTable {
    fn default() -> Self {
        PostingsTable::Raw(HashMap::new())
    }
}

impl PostingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> IndexMode {
        match self {
            PostingsTable::Raw(_) => IndexMode::Raw,
            PostingsTable::Compressed(_) => IndexMode::Compressed,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.mode() == IndexMode::Compressed
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        match self {
            PostingsTable::Raw(terms) => terms.len(),
            PostingsTable::Compressed(terms) => terms.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, term: &str) -> bool {
        match self {
            PostingsTable::Raw(terms) => terms.contains_key(term),
            PostingsTable::Compressed(terms) => terms.contains_key(term),
        }
    }

    /// Record that `term` occurs in the document with `ordinal`
    pub fn insert(&mut self, term: &str, ordinal: Ordinal) -> Result<()> {
        match self {
            PostingsTable::Raw(terms) => {
                match terms.get_mut(term) {
                    Some(set) => {
                        set.insert(ordinal.as_u32());
                    }
                    None => {
                        let mut set = RoaringBitmap::new();
                        set.insert(ordinal.as_u32());
                        terms.insert(term.to_string(), set);
                    }
                }
                Ok(())
            }
            PostingsTable::Compressed(_) => Err(IndexError::Sealed),
        }
    }

    /// Ordinal set of `term`, decoding compressed postings on demand
    pub fn lookup(&self, term: &str) -> Result<Option<Cow<'_, RoaringBitmap>>> {
        match self {
            PostingsTable::Raw(terms) => Ok(terms.get(term).map(Cow::Borrowed)),
            PostingsTable::Compressed(terms) => match terms.get(term) {
                Some(postings) => Ok(Some(Cow::Owned(postings.decode()?))),
                None => Ok(None),
            },
        }
    }

    /// Number of documents containing `term`
    pub fn doc_frequency(&self, term: &str) -> Option<u64> {
        match self {
            PostingsTable::Raw(terms) => terms.get(term).map(RoaringBitmap::len),
            PostingsTable::Compressed(terms) => {
                terms.get(term).map(|p| u64::from(p.doc_frequency))
            }
        }
    }

    /// Iterate over all terms (unordered)
    pub fn terms(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            PostingsTable::Raw(terms) => Box::new(terms.keys().map(String::as_str)),
            PostingsTable::Compressed(terms) => Box::new(terms.keys().map(String::as_str)),
        }
    }
}
