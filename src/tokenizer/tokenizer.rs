use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::config::TokenizerConfig;

/// Signed decimals first so `-3.5` is not split into `-`, `3`, `5`; then word
/// runs with internal `+` joins; then signed integers. A hyphen between two
/// numbers is the sign of the second one (`2024-2025` gives `2024`, `-2025`).
const TOKEN_PATTERN: &str = r"[-+]?\d*\.\d+|\w+(?:\+\w+)*|[-+]?\d+";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"));

/// Text tokenizer shared by ingestion and query parsing
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize text into a vector of terms, in order of appearance
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        TOKEN_RE
            .find_iter(text)
            .map(|m| {
                if self.config.lowercase {
                    m.as_str().to_lowercase()
                } else {
                    m.as_str().to_string()
                }
            })
            .collect()
    }

    /// Distinct terms of `text`, in first-seen order
    pub fn unique_terms(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenize(text)
            .into_iter()
            .filter(|token| seen.insert(token.clone()))
            .collect()
    }
}
