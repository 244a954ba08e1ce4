//! Query engine: phrase search and ranked term search.

pub mod phrase;
pub mod scorer;

pub use phrase::{next_phrase, phrase_search, PhraseMatch, PositionRange};
pub use scorer::{Bm25Scorer, TfIdfScorer};

use std::cmp::Ordering;

use ahash::AHashMap;

use crate::index::core::IndexCore;

/// One scored search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Document id.
    pub doc_id: u64,
    /// Accumulated BM25 score.
    pub score: f64,
}

/// Disjunctive ranked search over the query terms.
///
/// Every document carrying any query term is scored; each term contributes
/// its BM25 score to a per-document running total (document-at-a-time
/// accumulation, no top-k pruning). Results are sorted descending by score,
/// ties broken by ascending document id so the order is deterministic.
pub fn search(core: &IndexCore, terms: &[String]) -> Vec<SearchHit> {
    let total_docs = core.doc_count();
    let total_tokens = core.token_count();
    if total_docs == 0 {
        return Vec::new();
    }

    let mut scores: AHashMap<u64, f64> = AHashMap::new();
    for term in terms {
        let Some(list) = core.posting_list(term) else {
            continue;
        };
        let scorer = Bm25Scorer::new(total_docs, total_tokens, list.doc_frequency());
        for posting in list.iter() {
            let doc_length = core.doc_length(posting.doc_id()).unwrap_or(0);
            *scores.entry(posting.doc_id()).or_insert(0.0) +=
                scorer.score(doc_length, posting.term_frequency());
        }
    }

    let mut hits: Vec<SearchHit> = scores
        .into_iter()
        .map(|(doc_id, score)| SearchHit { doc_id, score })
        .collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    hits
}
