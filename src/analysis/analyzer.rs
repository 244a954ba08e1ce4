//! Analyzers that combine a tokenizer with a filter chain.

use std::sync::Arc;

use crate::analysis::filter::{LowercaseFilter, StemFilter, StopFilter, TokenFilter};
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer};
use crate::error::Result;

/// A trait for turning text into a normalized token stream.
pub trait Analyzer: Send + Sync + std::fmt::Debug {
    /// Analyze the given text.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;

    /// Analyze text and collect the term strings.
    fn analyze_terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

/// An analyzer that runs a tokenizer followed by a chain of filters.
#[derive(Debug, Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn TokenFilter>>,
}

impl PipelineAnalyzer {
    /// Create a pipeline analyzer with no filters.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Append a filter to the chain.
    pub fn add_filter(mut self, filter: Arc<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let mut stream = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            stream = filter.apply(stream);
        }
        Ok(stream)
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

/// The standard analyzer: tokenize, lowercase, stop words, stemming.
///
/// The stage order is significant; stop words are matched against lowercased
/// text and stemming runs last so stop words are compared verbatim.
#[derive(Debug, Clone)]
pub struct StandardAnalyzer {
    inner: PipelineAnalyzer,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer with the full pipeline.
    pub fn new() -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::new()?);
        let inner = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StopFilter::new()))
            .add_filter(Arc::new(StemFilter::new()));
        Ok(StandardAnalyzer { inner })
    }

    /// Create a standard analyzer without the stemming stage.
    pub fn without_stemming() -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::new()?);
        let inner = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StopFilter::new()));
        Ok(StandardAnalyzer { inner })
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer() {
        let analyzer = StandardAnalyzer::new().unwrap();
        let terms = analyzer.analyze_terms("The Black Cats").unwrap();

        // "the" is a stop word, "cats" stems to "cat"
        assert_eq!(terms, vec!["black", "cat"]);
    }

    #[test]
    fn test_standard_analyzer_without_stemming() {
        let analyzer = StandardAnalyzer::without_stemming().unwrap();
        let terms = analyzer.analyze_terms("The Black Cats").unwrap();
        assert_eq!(terms, vec!["black", "cats"]);
    }

    #[test]
    fn test_analyzer_is_deterministic() {
        let analyzer = StandardAnalyzer::new().unwrap();
        let first = analyzer.analyze_terms("white dogs running fast").unwrap();
        let second = analyzer.analyze_terms("white dogs running fast").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_stop_word_input_analyzes_to_nothing() {
        let analyzer = StandardAnalyzer::new().unwrap();
        let terms = analyzer.analyze_terms("the a and to").unwrap();
        assert!(terms.is_empty());
    }
}
