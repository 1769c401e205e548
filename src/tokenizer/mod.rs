//! Regex tokenizer shared by ingestion and query parsing.

#[allow(clippy::module_inception)]
mod tokenizer;

pub use tokenizer::Tokenizer;
