pub mod document;

pub use document::{DocumentId, Ordinal, Page, PageKey, SourceDocument};
