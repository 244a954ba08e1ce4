//! Inverted/forward index structures and lifecycle.

pub mod core;
pub mod index;
pub mod meta;
pub mod posting;
pub mod segment;

pub use core::{ForwardEntry, IndexCore, TermPosition};
pub use index::Index;
pub use meta::{IndexMeta, META_FILE_NAME};
pub use posting::{DocPosting, Position, PostingList};
pub use segment::{DeleteMeta, Segment, SegmentId, SegmentMeta};

/// A document submitted for indexing.
///
/// `id` is caller-assigned and must be unique while live; re-adding an
/// existing id replaces the previous version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Caller-assigned document id.
    pub id: u64,
    /// Raw document text.
    pub text: String,
}

impl Document {
    /// Create a new document.
    pub fn new<S: Into<String>>(id: u64, text: S) -> Self {
        Document {
            id,
            text: text.into(),
        }
    }
}
