//! Positional postings lists.
//!
//! A [`PostingList`] holds one [`DocPosting`] per document containing a
//! term, sorted strictly ascending by document id. Each posting records the
//! term's normalized frequency and its in-document positions, and supports
//! sub-linear forward search through a cache-seeded galloping strategy: a
//! one-slot index cache remembers where the previous lookup landed, the
//! probe doubles its jump from there, and a binary search resolves the
//! bracketed range. Sequential forward scans (the phrase-search access
//! pattern) are amortized sub-linear; random access degrades to `O(log n)`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A totally ordered position value with explicit infinities.
///
/// `NegativeInfinity` and `PositiveInfinity` are first-class "not found in
/// this direction" markers, ordered outside every finite position and
/// document id. A missing term yields a sentinel directly; it is never an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    /// Less than every finite value.
    NegativeInfinity,
    /// A real position or document id.
    Finite(u64),
    /// Greater than every finite value.
    PositiveInfinity,
}

impl Position {
    /// Whether this is a finite value.
    pub fn is_finite(&self) -> bool {
        matches!(self, Position::Finite(_))
    }

    /// Extract the finite value, if any.
    pub fn finite(&self) -> Option<u64> {
        match self {
            Position::Finite(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Position::Finite(value)
    }
}

/// A single term's occurrence record for one document.
#[derive(Debug)]
pub struct DocPosting {
    /// Document id.
    doc_id: u64,
    /// Term frequency: occurrences divided by the document's token count.
    term_frequency: f64,
    /// In-document term positions, strictly ascending, never empty.
    positions: Vec<u64>,
    /// One-slot index cache seeding the next forward search.
    ///
    /// A hint only, not part of logical equality. Relaxed atomics keep the
    /// search path `&self`; a stale value costs extra probes, never a wrong
    /// answer.
    cache: AtomicUsize,
}

impl Clone for DocPosting {
    fn clone(&self) -> Self {
        DocPosting {
            doc_id: self.doc_id,
            term_frequency: self.term_frequency,
            positions: self.positions.clone(),
            cache: AtomicUsize::new(0),
        }
    }
}

impl PartialEq for DocPosting {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
            && self.term_frequency == other.term_frequency
            && self.positions == other.positions
    }
}

impl DocPosting {
    /// Create a posting from ascending positions and a normalized frequency.
    pub fn new(doc_id: u64, term_frequency: f64, positions: Vec<u64>) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        DocPosting {
            doc_id,
            term_frequency,
            positions,
            cache: AtomicUsize::new(0),
        }
    }

    /// Document id of this posting.
    pub fn doc_id(&self) -> u64 {
        self.doc_id
    }

    /// Normalized term frequency.
    pub fn term_frequency(&self) -> f64 {
        self.term_frequency
    }

    /// In-document positions.
    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    /// First position, or `-∞` if there are none.
    pub fn first_position(&self) -> Position {
        match self.positions.first() {
            Some(&first) => Position::Finite(first),
            None => Position::NegativeInfinity,
        }
    }

    /// Last position, or `+∞` if there are none.
    pub fn last_position(&self) -> Position {
        match self.positions.last() {
            Some(&last) => Position::Finite(last),
            None => Position::PositiveInfinity,
        }
    }

    /// Find the first position strictly greater than `current`.
    ///
    /// Gallops forward from the cached slot of the previous call, then
    /// binary-searches the bracketed range. Returns `+∞` past the last
    /// occurrence.
    pub fn next_position(&self, current: Position) -> Position {
        let positions = &self.positions;
        let (first, last) = match (positions.first(), positions.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Position::PositiveInfinity,
        };

        let current = match current {
            Position::PositiveInfinity => return Position::PositiveInfinity,
            Position::NegativeInfinity => {
                self.cache.store(0, Ordering::Relaxed);
                return Position::Finite(first);
            }
            Position::Finite(value) => value,
        };

        if current >= last {
            return Position::PositiveInfinity;
        }
        if current < first {
            self.cache.store(0, Ordering::Relaxed);
            return Position::Finite(first);
        }

        // Seed the lower bound from the cache when it still precedes the
        // target, then double the jump until the probe overshoots.
        let mut low = 0;
        let cached = self.cache.load(Ordering::Relaxed);
        if cached > 0 && cached < positions.len() && positions[cached - 1] <= current {
            low = cached - 1;
        }

        let mut jump = 1;
        let mut high = low + jump;
        while high < positions.len() - 1 && positions[high] <= current {
            low = high;
            jump *= 2;
            high = low + jump;
        }
        if high > positions.len() - 1 {
            high = positions.len() - 1;
        }

        let next_index = Self::search_after(positions, low, high, current);
        self.cache.store(next_index, Ordering::Relaxed);
        Position::Finite(positions[next_index])
    }

    /// Find the greatest position strictly less than `current`.
    ///
    /// Plain binary search; the backward direction is only taken once per
    /// phrase rollback, so it carries no cache. Returns `-∞` at or before
    /// the first occurrence.
    pub fn prev_position(&self, current: Position) -> Position {
        let positions = &self.positions;
        let (first, last) = match (positions.first(), positions.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Position::NegativeInfinity,
        };

        let current = match current {
            Position::NegativeInfinity => return Position::NegativeInfinity,
            Position::PositiveInfinity => return Position::Finite(last),
            Position::Finite(value) => value,
        };

        if current <= first {
            return Position::NegativeInfinity;
        }
        if current > last {
            return Position::Finite(last);
        }

        let mut low = 0;
        let mut high = positions.len() - 1;
        while high - low > 1 {
            let mid = (low + high) / 2;
            if positions[mid] < current {
                low = mid;
            } else {
                high = mid;
            }
        }
        Position::Finite(positions[low])
    }

    /// Binary search for the first index in `(low, high]` whose position
    /// exceeds `current`. Requires `positions[low] <= current < positions[high]`.
    fn search_after(positions: &[u64], mut low: usize, mut high: usize, current: u64) -> usize {
        while high - low > 1 {
            let mid = (low + high) / 2;
            if positions[mid] > current {
                high = mid;
            } else {
                low = mid;
            }
        }
        high
    }
}

/// All postings for one term, strictly ascending by document id.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    postings: Vec<DocPosting>,
}

impl PostingList {
    /// Create an empty posting list.
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Number of documents carrying this term.
    pub fn doc_frequency(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of postings.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Posting at the given slot.
    pub fn get(&self, index: usize) -> Option<&DocPosting> {
        self.postings.get(index)
    }

    /// Iterate over the postings in ascending document-id order.
    pub fn iter(&self) -> std::slice::Iter<'_, DocPosting> {
        self.postings.iter()
    }

    /// Exact lookup of a document's posting.
    pub fn find_doc(&self, doc_id: u64) -> Option<&DocPosting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|index| &self.postings[index])
    }

    /// Index of the first posting with document id strictly greater than
    /// `doc`, or `None` past the end of the list.
    pub fn next_doc_index(&self, doc: Position) -> Option<usize> {
        let (first, last) = match (self.postings.first(), self.postings.last()) {
            (Some(first), Some(last)) => (first.doc_id, last.doc_id),
            _ => return None,
        };
        let doc = match doc {
            Position::PositiveInfinity => return None,
            Position::NegativeInfinity => return Some(0),
            Position::Finite(value) => value,
        };
        if doc >= last {
            return None;
        }
        if doc < first {
            return Some(0);
        }

        let mut low = 0;
        let mut high = self.postings.len() - 1;
        while high - low > 1 {
            let mid = (low + high) / 2;
            if self.postings[mid].doc_id > doc {
                high = mid;
            } else {
                low = mid;
            }
        }
        Some(high)
    }

    /// Index of the last posting with document id strictly less than `doc`,
    /// or `None` before the start of the list.
    pub fn prev_doc_index(&self, doc: Position) -> Option<usize> {
        let first = self.postings.first()?.doc_id;
        let doc = match doc {
            Position::NegativeInfinity => return None,
            Position::PositiveInfinity => return Some(self.postings.len() - 1),
            Position::Finite(value) => value,
        };
        if doc <= first {
            return None;
        }

        let mut low = 0;
        let mut high = self.postings.len() - 1;
        if self.postings[high].doc_id < doc {
            return Some(high);
        }
        while high - low > 1 {
            let mid = (low + high) / 2;
            if self.postings[mid].doc_id < doc {
                low = mid;
            } else {
                high = mid;
            }
        }
        Some(low)
    }

    /// Insert a posting, preserving ascending document-id order.
    ///
    /// An existing posting for the same document is replaced. Sorted splice
    /// rather than append-then-sort: postings lists are queried far more
    /// often than mutated and must stay query-ready.
    pub fn insert(&mut self, posting: DocPosting) {
        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(index) => self.postings[index] = posting,
            Err(index) => self.postings.insert(index, posting),
        }
    }

    /// Remove a document's posting. A miss is a silent no-op.
    pub fn remove(&mut self, doc_id: u64) -> bool {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(index) => {
                self.postings.remove(index);
                true
            }
            Err(_) => false,
        }
    }
}
