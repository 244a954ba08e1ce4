//! Per-batch segment construction.

use crate::analysis::StandardAnalyzer;
use crate::error::Result;
use crate::index::core::IndexCore;
use crate::index::segment::{Segment, SegmentId, SegmentMeta};
use crate::indexer::operation::AddOperation;
use crate::indexer::opstamp::Opstamp;

/// Builds one immutable segment from a run of stamped operations.
///
/// Each writer owns a private [`IndexCore`], so workers share no mutable
/// postings state while a segment is under construction. The heap budget is
/// advisory: the owning worker checks [`SegmentWriter::mem_usage`] between
/// operations and rolls the segment over once the estimate crosses the
/// budget.
#[derive(Debug)]
pub struct SegmentWriter {
    analyzer: StandardAnalyzer,
    core: IndexCore,
    heap_budget: usize,
    mem_usage: usize,
    max_opstamp: Opstamp,
}

impl SegmentWriter {
    /// Create a writer for a fresh segment.
    pub fn new(analyzer: StandardAnalyzer, heap_budget: usize) -> Self {
        SegmentWriter {
            analyzer,
            core: IndexCore::new(),
            heap_budget,
            mem_usage: 0,
            max_opstamp: 0,
        }
    }

    /// Index one stamped operation into the segment.
    pub fn index_operation(&mut self, operation: &AddOperation) -> Result<()> {
        let tokens_before = self.core.token_count();
        self.core
            .add_document(&self.analyzer, &operation.document)?;

        // Rough per-document accounting: raw text plus one u64 position per
        // indexed token. Only has to be monotone and in the right ballpark.
        let new_tokens = (self.core.token_count() - tokens_before) as usize;
        self.mem_usage += operation.document.text.len()
            + new_tokens * std::mem::size_of::<u64>()
            + std::mem::size_of::<AddOperation>();

        self.max_opstamp = self.max_opstamp.max(operation.opstamp);
        Ok(())
    }

    /// Estimated heap usage of the segment under construction.
    pub fn mem_usage(&self) -> usize {
        self.mem_usage
    }

    /// Whether the estimate has crossed the heap budget.
    pub fn is_full(&self) -> bool {
        self.mem_usage >= self.heap_budget
    }

    /// Number of documents indexed so far.
    pub fn doc_count(&self) -> u64 {
        self.core.doc_count()
    }

    /// Seal the segment. Returns the built segment and the highest opstamp
    /// among its operations.
    pub fn finish(self) -> (Segment, Opstamp) {
        let meta = SegmentMeta::new(SegmentId::new(), self.core.doc_count() as u32);
        (Segment::new(meta, self.core), self.max_opstamp)
    }
}
