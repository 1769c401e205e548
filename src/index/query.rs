//! Conjunctive query resolution

use std::borrow::Cow;
use std::collections::HashSet;

use roaring::RoaringBitmap;
use tracing::debug;

use super::postings::PostingsTable;
use super::registry::DocumentRegistry;
use crate::error::{IndexError, Result};
use crate::models::{DocumentId, Ordinal};
use crate::tokenizer::Tokenizer;

/// A parsed AND query: the distinct terms of the query text in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    /// Parse `text` with the same tokenizer used for ingestion
    pub fn parse(tokenizer: &Tokenizer, text: &str) -> Self {
        Self {
            terms: tokenizer.unique_terms(text),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Ordinals of documents containing every term
    ///
    /// Returns an empty set as soon as a term is unknown or the running
    /// intersection becomes empty.
    pub fn matching_ordinals(&self, postings: &PostingsTable) -> Result<RoaringBitmap> {
        let mut result: Option<RoaringBitmap> = None;

        for term in &self.terms {
            let Some(set) = postings.lookup(term)? else {
                debug!(term = %term, "unknown query term");
                return Ok(RoaringBitmap::new());
            };

            let next = match result {
                None => set.into_owned(),
                Some(mut acc) => {
                    match set {
                        Cow::Borrowed(set) => acc &= set,
                        Cow::Owned(set) => acc &= set,
                    }
                    acc
                }
            };

            if next.is_empty() {
                return Ok(next);
            }
            result = Some(next);
        }

        Ok(result.unwrap_or_default())
    }

    /// External ids of documents containing every term
    ///
    /// The order of the returned ids is unspecified.
    pub fn execute(
        &self,
        postings: &PostingsTable,
        registry: &DocumentRegistry,
    ) -> Result<Vec<DocumentId>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let ordinals = self.matching_ordinals(postings)?;
        let mut ids = Vec::with_capacity(ordinals.len() as usize);
        for ordinal in &ordinals {
            let id = registry.resolve(Ordinal::new(ordinal)).ok_or_else(|| {
                IndexError::Corrupt(format!("postings reference unknown ordinal {}", ordinal))
            })?;
            ids.push(id.to_string());
        }
        Ok(ids)
    }
}

/// Deduplicated id set, for order-independent comparison of results
pub fn id_set(ids: &[DocumentId]) -> HashSet<&str> {
    ids.iter().map(String::as_str).collect()
}
