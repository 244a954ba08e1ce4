//! # falx
//!
//! A single-node full-text search core.
//!
//! falx builds an inverted index over documents and answers term, phrase,
//! and ranked relevance queries. Positional postings lists support
//! sub-linear galloping search, relevance is scored with TF-IDF or Okapi
//! BM25, and a concurrent segment write pipeline lets multiple worker
//! threads index documents in parallel while preserving a single, monotonic
//! commit order.
//!
//! ## Features
//!
//! - Positional postings lists with cache-seeded galloping search
//! - Exact phrase queries built on the position primitives
//! - TF-IDF and Okapi BM25 relevance scoring
//! - Immutable segments built by a pool of worker threads
//! - Pluggable storage backends with JSON index metadata

pub mod analysis;
pub mod error;
pub mod index;
pub mod indexer;
pub mod query;
pub mod storage;

pub use error::{FalxError, Result};
pub use index::{Document, Index};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
