//! Segments: immutable, independently built shards of index data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::index::core::IndexCore;
use crate::indexer::opstamp::Opstamp;

/// Opaque unique segment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    /// Generate a fresh segment id.
    pub fn new() -> Self {
        SegmentId(Uuid::new_v4().to_string())
    }

    /// The id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deletion bookkeeping for a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMeta {
    /// Number of documents deleted from the segment.
    #[serde(rename = "numDeletedDocs")]
    pub num_deleted_docs: u64,
    /// Opstamp of the delete operation the count reflects.
    #[serde(rename = "operationId")]
    pub opstamp: Opstamp,
}

/// Persisted description of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Unique segment id.
    #[serde(rename = "segmentId")]
    pub segment_id: SegmentId,
    /// Number of documents in the segment.
    #[serde(rename = "maxDoc")]
    pub max_doc: u32,
    /// Deletion bookkeeping, if any documents were deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletes: Option<DeleteMeta>,
}

impl SegmentMeta {
    /// Create metadata for a freshly built segment.
    pub fn new(segment_id: SegmentId, max_doc: u32) -> Self {
        SegmentMeta {
            segment_id,
            max_doc,
            deletes: None,
        }
    }
}

/// An immutable segment: its metadata plus the index data built for it.
///
/// Workers never share mutable postings state; each batch of operations
/// maps to exactly one segment, so no locking is needed while a segment is
/// under construction, and none is needed afterwards because a built
/// segment is never mutated.
#[derive(Debug)]
pub struct Segment {
    meta: SegmentMeta,
    core: IndexCore,
}

impl Segment {
    /// Wrap a built core with its metadata.
    pub fn new(meta: SegmentMeta, core: IndexCore) -> Self {
        Segment { meta, core }
    }

    /// Segment metadata.
    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    /// The segment's index data.
    pub fn core(&self) -> &IndexCore {
        &self.core
    }

    /// Number of documents in the segment.
    pub fn doc_count(&self) -> u64 {
        self.core.doc_count()
    }
}
