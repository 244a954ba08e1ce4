//! Text analysis pipeline.
//!
//! Analysis turns raw document text into a normalized sequence of terms.
//! The pipeline stages are fixed and order-significant: tokenize, lowercase,
//! stop-word removal, stemming. Analysis is a deterministic, pure function
//! of its input text.

pub mod analyzer;
pub mod filter;
pub mod token;
pub mod tokenizer;

pub use analyzer::{Analyzer, StandardAnalyzer};
pub use filter::{LowercaseFilter, StemFilter, StopFilter, TokenFilter};
pub use token::{Token, TokenStream};
pub use tokenizer::{RegexTokenizer, Tokenizer};
