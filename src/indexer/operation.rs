//! Stamped write operations.

use crate::index::Document;
use crate::indexer::opstamp::Opstamp;

/// A document addition stamped with its place in the operation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOperation {
    /// Stamp allocated at submission time.
    pub opstamp: Opstamp,
    /// The document to index.
    pub document: Document,
}

impl AddOperation {
    /// Pair a document with its opstamp.
    pub fn new(opstamp: Opstamp, document: Document) -> Self {
        AddOperation { opstamp, document }
    }
}
