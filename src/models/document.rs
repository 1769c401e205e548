use serde::{Deserialize, Serialize};
use std::fmt;

/// External document identifier (typically a URL or a page key)
pub type DocumentId = String;

/// Integer key assigned by a page store in insertion order
pub type PageKey = u64;

/// Dense document ordinal assigned in ingestion order, starting at 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ordinal(pub u32);

impl Ordinal {
    pub const FIRST: Ordinal = Ordinal(1);

    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Position of this ordinal in a dense, zero-based array
    pub fn slot(self) -> usize {
        (self.0 as usize).wrapping_sub(1)
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A document pulled from a source for ingestion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A crawled page as held by a page store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub key: PageKey,
    pub url: String,
    pub text: String,
}

impl Page {
    /// Source document keyed by the page key, as the indexer ingests pages
    pub fn to_source_document(&self) -> SourceDocument {
        SourceDocument::new(self.key.to_string(), self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_slots() {
        assert_eq!(Ordinal::FIRST.slot(), 0);
        assert_eq!(Ordinal::new(5).slot(), 4);
        assert_eq!(Ordinal::FIRST.next(), Some(Ordinal::new(2)));
        assert_eq!(Ordinal::new(u32::MAX).next(), None);
        assert_eq!(Ordinal::new(3).to_string(), "#3");
    }

    #[test]
    fn test_page_to_source_document() {
        let page = Page {
            key: 7,
            url: "https://example.org/a".to_string(),
            text: "hello".to_string(),
        };
        assert_eq!(page.to_source_document(), SourceDocument::new("7", "hello"));
    }
}
