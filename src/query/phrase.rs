//! Exact phrase matching over positional postings.

use crate::index::core::{IndexCore, TermPosition};
use crate::index::posting::Position;

/// An inclusive range of in-document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    /// Position of the first phrase term.
    pub from: Position,
    /// Position of the last phrase term.
    pub to: Position,
}

/// One confirmed phrase occurrence, or the `+∞` sentinel when exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Document carrying the occurrence.
    pub doc_id: Position,
    /// Where in the document the phrase spans.
    pub range: PositionRange,
}

impl PhraseMatch {
    /// The sentinel returned when no further occurrence exists.
    pub fn exhausted() -> Self {
        PhraseMatch {
            doc_id: Position::PositiveInfinity,
            range: PositionRange {
                from: Position::PositiveInfinity,
                to: Position::PositiveInfinity,
            },
        }
    }

    /// Whether this is the exhausted sentinel.
    pub fn is_exhausted(&self) -> bool {
        self.doc_id == Position::PositiveInfinity
    }
}

/// Find the next occurrence of the exact ordered, contiguous term sequence
/// at or after `start`.
///
/// Advances through the first term to a candidate `from`, then chains each
/// following term through [`IndexCore::next_term_position`] starting from
/// the previous term's occurrence. The candidate is confirmed when the last
/// term lands in the same document exactly `terms.len() - 1` positions
/// later; otherwise the scan restarts from `from`, which strictly advances,
/// so termination is guaranteed.
pub fn next_phrase(core: &IndexCore, terms: &[String], start: TermPosition) -> PhraseMatch {
    let term_count = terms.len();
    if term_count == 0 {
        return PhraseMatch::exhausted();
    }

    let mut start = start;
    loop {
        let from = core.next_term_position(&terms[0], start);
        if from.doc_id == Position::PositiveInfinity {
            return PhraseMatch::exhausted();
        }

        let mut to = from;
        for term in &terms[1..] {
            to = core.next_term_position(term, to);
        }

        if to.doc_id == from.doc_id {
            if let (Some(from_pos), Some(to_pos)) = (from.position.finite(), to.position.finite())
            {
                if to_pos - from_pos == term_count as u64 - 1 {
                    return PhraseMatch {
                        doc_id: from.doc_id,
                        range: PositionRange {
                            from: from.position,
                            to: to.position,
                        },
                    };
                }
            }
        }

        // The terms matched but not contiguously in one document; rescan
        // from where the first term was actually found.
        start = from;
    }
}

/// Collect every document containing the phrase, in first-match order.
///
/// Repeatedly calls [`next_phrase`] from the scan origin, deduplicating
/// consecutive same-document hits, until the sentinel is returned. An empty
/// phrase yields no matches.
pub fn phrase_search(core: &IndexCore, terms: &[String]) -> Vec<u64> {
    let mut doc_ids = Vec::new();
    let mut cursor = TermPosition::origin();

    loop {
        let found = next_phrase(core, terms, cursor);
        let Some(doc_id) = found.doc_id.finite() else {
            break;
        };
        if doc_ids.last() != Some(&doc_id) {
            doc_ids.push(doc_id);
        }
        cursor = TermPosition::new(found.doc_id, found.range.from);
    }

    doc_ids
}
