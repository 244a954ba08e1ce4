//! Token filters that normalize a token stream.
//!
//! Filters are applied in a fixed order by the analyzer: lowercase first,
//! then stop-word removal, then stemming.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::analysis::token::{Token, TokenStream};

/// Default English stop words.
///
/// Terms on this list are removed during analysis and therefore never
/// indexed; a query consisting only of stop words analyzes to zero terms.
const ENGLISH_STOP_WORDS: &[&str] = &["a", "and", "be", "have", "i", "in", "of", "that", "the", "to"];

static ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// A trait for transforming a token stream.
pub trait TokenFilter: Send + Sync + std::fmt::Debug {
    /// Apply the filter to a token stream.
    fn apply(&self, input: TokenStream) -> TokenStream;

    /// Get the name of this filter.
    fn name(&self) -> &'static str;
}

/// A filter that lowercases token text.
#[derive(Debug, Clone, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl TokenFilter for LowercaseFilter {
    fn apply(&self, input: TokenStream) -> TokenStream {
        Box::new(input.map(|mut token| {
            token.text = token.text.to_lowercase();
            token
        }))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

/// A filter that removes common stop words.
#[derive(Debug, Clone)]
pub struct StopFilter {
    stop_words: HashSet<String>,
}

impl StopFilter {
    /// Create a stop filter with the default English stop word list.
    pub fn new() -> Self {
        StopFilter {
            stop_words: ENGLISH_STOP_WORDS_SET.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a stop filter with a custom word list.
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopFilter {
            stop_words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenFilter for StopFilter {
    fn apply(&self, input: TokenStream) -> TokenStream {
        let stop_words = self.stop_words.clone();
        Box::new(input.filter(move |token| !stop_words.contains(&token.text)))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

/// A suffix-stripping stemmer filter.
///
/// Removes the longest matching suffix from tokens long enough to keep a
/// meaningful stem. This deliberately trades linguistic precision for
/// determinism; documents and queries pass through the same filter, so
/// matching stays consistent.
#[derive(Debug, Clone)]
pub struct StemFilter {
    /// Suffixes to strip, checked longest first.
    suffixes: Vec<&'static str>,
}

impl StemFilter {
    /// Create a new stem filter with common English suffixes.
    pub fn new() -> Self {
        let mut suffixes = vec![
            "ing", "ed", "ly", "ies", "ied", "es", "s", "tion", "sion", "ment", "ness", "ful",
        ];
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        StemFilter { suffixes }
    }

    fn stem(&self, word: &str) -> String {
        if word.len() <= 3 {
            return word.to_string();
        }
        for suffix in &self.suffixes {
            if word.len() > suffix.len() + 2 && word.ends_with(suffix) {
                return word[..word.len() - suffix.len()].to_string();
            }
        }
        word.to_string()
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenFilter for StemFilter {
    fn apply(&self, input: TokenStream) -> TokenStream {
        let filter = self.clone();
        Box::new(input.map(move |mut token| {
            token.text = filter.stem(&token.text);
            token
        }))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}
