use std::collections::VecDeque;

use crate::error::Result;
use crate::models::SourceDocument;
use crate::persistence::PageStore;

/// Pull-based producer of documents to ingest
///
/// Any iterator of `Result<SourceDocument>` is a source; a crawler plugs in
/// by yielding `(url, text)` pairs as documents.
pub trait DocumentSource: Iterator<Item = Result<SourceDocument>> {}

impl<T> DocumentSource for T where T: Iterator<Item = Result<SourceDocument>> {}

/// Wrap infallible `(id, text)` pairs as a document source
pub fn from_pairs<I, K, V>(pairs: I) -> impl DocumentSource
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(id, text)| Ok(SourceDocument::new(id, text)))
}

/// Batched cursor over a page store
///
/// Yields every page keyed by its page key, fetching `batch_size` pages at a
/// time. `rewind` restarts from the first page.
pub struct PageCursor<'a, S: PageStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    offset: usize,
    buffer: VecDeque<SourceDocument>,
    done: bool,
}

impl<'a, S: PageStore + ?Sized> PageCursor<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            offset: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    pub fn rewind(&mut self) {
        self.offset = 0;
        self.buffer.clear();
        self.done = false;
    }

    fn fill(&mut self) -> Result<()> {
        let pages = self.store.scan(self.offset, self.batch_size)?;
        if pages.is_empty() {
            self.done = true;
        }
        self.offset += pages.len();
        self.buffer
            .extend(pages.iter().map(|page| page.to_source_document()));
        Ok(())
    }
}

impl<S: PageStore + ?Sized> Iterator for PageCursor<'_, S> {
    type Item = Result<SourceDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
