//! Relevance scoring formulas.
//!
//! Scorers are stateless formula objects parameterized by corpus statistics
//! at construction; the query engine builds one per query term and feeds it
//! per-document statistics.

/// BM25 saturation constant.
const K: f64 = 2.0;
/// BM25 length-normalization constant.
const B: f64 = 0.75;

/// TF-IDF scorer for one term.
///
/// `idf = 1 + log2(total_docs / (1 + df))`. The `+1` in the denominator
/// avoids division by zero for an empty corpus and dampens rare-term
/// blowup.
#[derive(Debug, Clone, Copy)]
pub struct TfIdfScorer {
    idf: f64,
}

impl TfIdfScorer {
    /// Build a scorer from corpus statistics.
    pub fn new(total_docs: u64, doc_frequency: u64) -> Self {
        let df = 1.0 + doc_frequency as f64;
        TfIdfScorer {
            idf: 1.0 + (total_docs as f64 / df).log2(),
        }
    }

    /// Score a document carrying the term with normalized frequency `tf`.
    pub fn score(&self, term_frequency: f64) -> f64 {
        term_frequency * self.idf
    }
}

/// Okapi BM25 scorer for one term.
///
/// `idf = 1 + log2(1 + (N - df + 0.5) / (df + 0.5))` with `df` the raw
/// document frequency (0 for an absent term; this is deliberately not the
/// TF-IDF smoothing, per the standard BM25 definition).
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    idf: f64,
    average_doc_length: f64,
}

impl Bm25Scorer {
    /// Build a scorer from corpus statistics.
    pub fn new(total_docs: u64, total_tokens: u64, doc_frequency: u64) -> Self {
        let n = total_docs as f64;
        let df = doc_frequency as f64;
        let idf = 1.0 + (1.0 + (n - df + 0.5) / (df + 0.5)).log2();
        Bm25Scorer {
            idf,
            average_doc_length: total_tokens as f64 / total_docs as f64,
        }
    }

    /// Score a document of `doc_length` tokens carrying the term with
    /// normalized frequency `tf`.
    pub fn score(&self, doc_length: u64, term_frequency: f64) -> f64 {
        let tf = term_frequency;
        let length_norm = 1.0 - B + B * (doc_length as f64 / self.average_doc_length);
        self.idf * (tf * (K + 1.0)) / (tf + K * length_norm)
    }
}
