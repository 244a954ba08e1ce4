//! The unsynchronized inverted/forward index aggregate.
//!
//! [`IndexCore`] owns every posting list plus the per-document reverse map
//! needed for deletion and document-length statistics. It carries no locking
//! of its own; the public [`Index`](crate::index::Index) wraps it in a
//! reader-writer lock, and each pipeline segment owns a private core.

use ahash::{AHashMap, AHashSet};

use crate::analysis::Analyzer;
use crate::error::Result;
use crate::index::posting::{DocPosting, Position, PostingList};
use crate::index::Document;

/// Per-document bookkeeping: token count and the set of distinct terms.
///
/// Lets deletion touch exactly the posting lists that carry the document,
/// and average-document-length statistics be maintained, without
/// re-tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardEntry {
    /// Number of tokens in the document after analysis.
    pub token_count: u64,
    /// Distinct terms occurring in the document.
    pub terms: AHashSet<String>,
}

/// A (document, position) cursor in a term's occurrence space.
///
/// Both components can be infinite: `(+∞, +∞)` means "no further
/// occurrence", `(-∞, -∞)` is the canonical scan origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermPosition {
    /// Document id, possibly a sentinel.
    pub doc_id: Position,
    /// In-document position, possibly a sentinel.
    pub position: Position,
}

impl TermPosition {
    /// Create a term position.
    pub fn new(doc_id: Position, position: Position) -> Self {
        TermPosition { doc_id, position }
    }

    /// The scan origin, before every real occurrence.
    pub fn origin() -> Self {
        TermPosition::new(Position::NegativeInfinity, Position::NegativeInfinity)
    }

    /// The exhausted cursor, past every real occurrence.
    pub fn exhausted() -> Self {
        TermPosition::new(Position::PositiveInfinity, Position::PositiveInfinity)
    }
}

/// The in-memory inverted and forward index.
#[derive(Debug, Clone, Default)]
pub struct IndexCore {
    /// Term to posting-list map.
    postings: AHashMap<String, PostingList>,
    /// Document id to forward entry map.
    forward: AHashMap<u64, ForwardEntry>,
    /// Number of live documents.
    total_docs: u64,
    /// Sum of token counts over live documents.
    total_tokens: u64,
}

impl IndexCore {
    /// Create an empty core.
    pub fn new() -> Self {
        IndexCore::default()
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> u64 {
        self.total_docs
    }

    /// Total token count over live documents.
    pub fn token_count(&self) -> u64 {
        self.total_tokens
    }

    /// Posting list for a term, if any document carries it.
    pub fn posting_list(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Number of documents carrying a term (0 for an unknown term).
    pub fn doc_frequency(&self, term: &str) -> u64 {
        self.postings
            .get(term)
            .map(|list| list.doc_frequency())
            .unwrap_or(0)
    }

    /// Token count of a live document.
    pub fn doc_length(&self, doc_id: u64) -> Option<u64> {
        self.forward.get(&doc_id).map(|entry| entry.token_count)
    }

    /// Whether a document id is live.
    pub fn contains_doc(&self, doc_id: u64) -> bool {
        self.forward.contains_key(&doc_id)
    }

    /// Iterate over the distinct indexed terms.
    pub fn terms(&self) -> impl Iterator<Item = &String> {
        self.postings.keys()
    }

    /// Analyze and index a document.
    ///
    /// A live document with the same id is deleted first, so re-adding is an
    /// idempotent replace and the corpus statistics stay consistent.
    pub fn add_document(&mut self, analyzer: &dyn Analyzer, document: &Document) -> Result<()> {
        if self.forward.contains_key(&document.id) {
            self.delete_document(document.id);
        }

        let terms = analyzer.analyze_terms(&document.text)?;
        let token_count = terms.len() as u64;

        let mut positions_by_term: AHashMap<String, Vec<u64>> = AHashMap::new();
        for (position, term) in terms.into_iter().enumerate() {
            positions_by_term
                .entry(term)
                .or_default()
                .push(position as u64);
        }

        let mut unique_terms = AHashSet::with_capacity(positions_by_term.len());
        for (term, positions) in positions_by_term {
            let term_frequency = positions.len() as f64 / token_count as f64;
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(DocPosting::new(document.id, term_frequency, positions));
            unique_terms.insert(term);
        }

        self.forward.insert(
            document.id,
            ForwardEntry {
                token_count,
                terms: unique_terms,
            },
        );
        self.total_docs += 1;
        self.total_tokens += token_count;
        Ok(())
    }

    /// Remove a document. Deleting an unknown id is a tolerated no-op.
    pub fn delete_document(&mut self, doc_id: u64) -> bool {
        let Some(entry) = self.forward.remove(&doc_id) else {
            return false;
        };

        for term in &entry.terms {
            if let Some(list) = self.postings.get_mut(term) {
                list.remove(doc_id);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }

        self.total_docs -= 1;
        self.total_tokens -= entry.token_count;
        true
    }

    /// First occurrence of a term across the corpus, or the `-∞` pair if the
    /// term is absent.
    pub fn first_term_position(&self, term: &str) -> TermPosition {
        match self.postings.get(term).and_then(|list| list.get(0)) {
            Some(posting) => {
                TermPosition::new(Position::Finite(posting.doc_id()), posting.first_position())
            }
            None => TermPosition::origin(),
        }
    }

    /// Last occurrence of a term across the corpus, or the `+∞` pair if the
    /// term is absent.
    pub fn last_term_position(&self, term: &str) -> TermPosition {
        let last = self
            .postings
            .get(term)
            .and_then(|list| list.get(list.len().wrapping_sub(1)));
        match last {
            Some(posting) => {
                TermPosition::new(Position::Finite(posting.doc_id()), posting.last_position())
            }
            None => TermPosition::exhausted(),
        }
    }

    /// Next occurrence of a term strictly after `current`, in (doc id,
    /// position) order. Returns the `+∞` pair when exhausted or the term is
    /// unknown.
    pub fn next_term_position(&self, term: &str, current: TermPosition) -> TermPosition {
        let Some(list) = self.postings.get(term) else {
            return TermPosition::exhausted();
        };
        if current.doc_id == Position::PositiveInfinity {
            return TermPosition::exhausted();
        }

        // Remaining occurrences inside the current document first.
        if let Some(doc_id) = current.doc_id.finite() {
            if let Some(posting) = list.find_doc(doc_id) {
                let position = posting.next_position(current.position);
                if position.is_finite() {
                    return TermPosition::new(current.doc_id, position);
                }
            }
        }

        match list.next_doc_index(current.doc_id).and_then(|i| list.get(i)) {
            Some(posting) => {
                TermPosition::new(Position::Finite(posting.doc_id()), posting.first_position())
            }
            None => TermPosition::exhausted(),
        }
    }

    /// Previous occurrence of a term strictly before `current`. Returns the
    /// `-∞` pair when exhausted or the term is unknown.
    pub fn prev_term_position(&self, term: &str, current: TermPosition) -> TermPosition {
        let Some(list) = self.postings.get(term) else {
            return TermPosition::origin();
        };
        if current.doc_id == Position::NegativeInfinity {
            return TermPosition::origin();
        }

        if let Some(doc_id) = current.doc_id.finite() {
            if let Some(posting) = list.find_doc(doc_id) {
                let position = posting.prev_position(current.position);
                if position.is_finite() {
                    return TermPosition::new(current.doc_id, position);
                }
            }
        }

        match list.prev_doc_index(current.doc_id).and_then(|i| list.get(i)) {
            Some(posting) => {
                TermPosition::new(Position::Finite(posting.doc_id()), posting.last_position())
            }
            None => TermPosition::origin(),
        }
    }

    /// Check the aggregate invariants. Test support.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let forward_tokens: u64 = self.forward.values().map(|e| e.token_count).sum();
        assert_eq!(self.total_tokens, forward_tokens);
        assert_eq!(self.total_docs, self.forward.len() as u64);

        for (term, list) in &self.postings {
            assert!(!list.is_empty(), "empty posting list left behind: {term}");
            let mut prev: Option<u64> = None;
            for posting in list.iter() {
                if let Some(prev) = prev {
                    assert!(prev < posting.doc_id(), "posting list out of order");
                }
                prev = Some(posting.doc_id());
                assert!(
                    posting.positions().windows(2).all(|w| w[0] < w[1]),
                    "positions not strictly ascending"
                );
                let entry = self.forward.get(&posting.doc_id()).expect("orphan posting");
                assert!(entry.terms.contains(term), "forward entry missing term");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;

    fn core_with(docs: &[(u64, &str)]) -> (StandardAnalyzer, IndexCore) {
        let analyzer = StandardAnalyzer::new().unwrap();
        let mut core = IndexCore::new();
        for (id, text) in docs {
            core.add_document(&analyzer, &Document::new(*id, *text)).unwrap();
        }
        (analyzer, core)
    }

    #[test]
    fn test_add_document_updates_statistics() {
        let (_, core) = core_with(&[(1, "black cat"), (2, "white cat runs")]);

        assert_eq!(core.doc_count(), 2);
        assert_eq!(core.token_count(), 5);
        assert_eq!(core.doc_frequency("cat"), 2);
        assert_eq!(core.doc_frequency("black"), 1);
        assert_eq!(core.doc_frequency("zebra"), 0);
        core.assert_consistent();
    }

    #[test]
    fn test_term_frequency_is_normalized() {
        let (_, core) = core_with(&[(1, "cat cat dog")]);

        let posting = core.posting_list("cat").unwrap().find_doc(1).unwrap();
        assert!((posting.term_frequency() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(posting.positions(), &[0, 1]);
    }

    #[test]
    fn test_idempotent_replace() {
        let analyzer = StandardAnalyzer::new().unwrap();
        let mut once = IndexCore::new();
        once.add_document(&analyzer, &Document::new(1, "black cat")).unwrap();

        let mut twice = IndexCore::new();
        twice.add_document(&analyzer, &Document::new(1, "black cat")).unwrap();
        twice.add_document(&analyzer, &Document::new(1, "black cat")).unwrap();

        assert_eq!(once.doc_count(), twice.doc_count());
        assert_eq!(once.token_count(), twice.token_count());
        assert_eq!(
            once.posting_list("cat").unwrap().find_doc(1),
            twice.posting_list("cat").unwrap().find_doc(1)
        );
        twice.assert_consistent();
    }

    #[test]
    fn test_replace_changes_content() {
        let analyzer = StandardAnalyzer::new().unwrap();
        let mut core = IndexCore::new();
        core.add_document(&analyzer, &Document::new(1, "black cat")).unwrap();
        core.add_document(&analyzer, &Document::new(1, "white dog")).unwrap();

        assert_eq!(core.doc_count(), 1);
        assert_eq!(core.doc_frequency("black"), 0);
        assert_eq!(core.doc_frequency("dog"), 1);
        core.assert_consistent();
    }

    #[test]
    fn test_delete_document() {
        let (_, mut core) = core_with(&[(1, "black cat"), (2, "black dog")]);

        assert!(core.delete_document(1));
        assert_eq!(core.doc_count(), 1);
        assert_eq!(core.doc_frequency("cat"), 0);
        assert_eq!(core.doc_frequency("black"), 1);
        core.assert_consistent();

        // Unknown id is a no-op, not an error.
        assert!(!core.delete_document(42));
        assert_eq!(core.doc_count(), 1);
    }

    #[test]
    fn test_first_and_last_term_position() {
        let (_, core) = core_with(&[(1, "cat dog cat"), (3, "dog cat")]);

        assert_eq!(
            core.first_term_position("cat"),
            TermPosition::new(Position::Finite(1), Position::Finite(0))
        );
        assert_eq!(
            core.last_term_position("cat"),
            TermPosition::new(Position::Finite(3), Position::Finite(1))
        );
        assert_eq!(core.first_term_position("zebra"), TermPosition::origin());
        assert_eq!(core.last_term_position("zebra"), TermPosition::exhausted());
    }

    #[test]
    fn test_next_term_position_walks_documents() {
        let (_, core) = core_with(&[(1, "cat dog cat"), (3, "dog cat")]);

        let mut cursor = TermPosition::origin();
        let mut seen = Vec::new();
        loop {
            cursor = core.next_term_position("cat", cursor);
            let (Some(doc), Some(pos)) = (cursor.doc_id.finite(), cursor.position.finite()) else {
                break;
            };
            seen.push((doc, pos));
        }
        assert_eq!(seen, vec![(1, 0), (1, 2), (3, 1)]);
    }

    #[test]
    fn test_next_term_position_sentinels() {
        let (_, core) = core_with(&[(1, "cat")]);

        assert_eq!(
            core.next_term_position("cat", TermPosition::exhausted()),
            TermPosition::exhausted()
        );
        assert_eq!(
            core.next_term_position("zebra", TermPosition::origin()),
            TermPosition::exhausted()
        );
        assert_eq!(
            core.prev_term_position("cat", TermPosition::origin()),
            TermPosition::origin()
        );
        assert_eq!(
            core.prev_term_position("zebra", TermPosition::exhausted()),
            TermPosition::origin()
        );
    }

    #[test]
    fn test_prev_term_position_walks_backwards() {
        let (_, core) = core_with(&[(1, "cat dog cat"), (3, "dog cat")]);

        let mut cursor = TermPosition::exhausted();
        let mut seen = Vec::new();
        loop {
            cursor = core.prev_term_position("cat", cursor);
            let (Some(doc), Some(pos)) = (cursor.doc_id.finite(), cursor.position.finite()) else {
                break;
            };
            seen.push((doc, pos));
        }
        assert_eq!(seen, vec![(3, 1), (1, 2), (1, 0)]);
    }

    #[test]
    fn test_all_stop_word_document_is_live_but_unsearchable() {
        let (_, mut core) = core_with(&[(1, "the a to")]);

        assert_eq!(core.doc_count(), 1);
        assert_eq!(core.token_count(), 0);
        assert!(core.contains_doc(1));
        core.assert_consistent();

        assert!(core.delete_document(1));
        assert_eq!(core.doc_count(), 0);
    }
}
