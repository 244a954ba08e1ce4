//! Committed/uncommitted segment state.

use parking_lot::Mutex;

use crate::index::segment::SegmentMeta;
use crate::indexer::opstamp::Opstamp;
use crate::indexer::segment_register::{SegmentEntry, SegmentRegister};

#[derive(Debug, Default)]
struct SegmentRegisters {
    uncommitted: SegmentRegister,
    committed: SegmentRegister,
}

/// Tracks which built segments are query-visible.
///
/// Freshly built segments land in the uncommitted register; a commit at
/// opstamp N moves exactly the entries whose max opstamp is at or below N
/// into the committed register. Both registers live under one mutex so a
/// segment is never observable in both, or neither, mid-move.
#[derive(Debug, Default)]
pub struct SegmentManager {
    registers: Mutex<SegmentRegisters>,
}

impl SegmentManager {
    /// Create a manager with no segments.
    pub fn new() -> Self {
        SegmentManager::default()
    }

    /// Create a manager whose committed register is pre-seeded from
    /// persisted metadata.
    pub fn from_committed(metas: Vec<SegmentMeta>, opstamp: Opstamp) -> Self {
        let manager = SegmentManager::new();
        {
            let mut registers = manager.registers.lock();
            for meta in metas {
                registers.committed.add(SegmentEntry::new(meta, opstamp));
            }
        }
        manager
    }

    /// Register a freshly built, not yet committed segment.
    pub fn register_uncommitted(&self, entry: SegmentEntry) {
        self.registers.lock().uncommitted.add(entry);
    }

    /// Move every uncommitted segment stamped at or below `target` into the
    /// committed register and return the full committed segment list.
    pub fn commit(&self, target: Opstamp) -> Vec<SegmentMeta> {
        let mut registers = self.registers.lock();
        for entry in registers.uncommitted.drain_through(target) {
            registers.committed.add(entry);
        }
        registers.committed.metas()
    }

    /// Metadata of every committed segment.
    pub fn committed_metas(&self) -> Vec<SegmentMeta> {
        self.registers.lock().committed.metas()
    }

    /// Number of segments awaiting commit.
    pub fn uncommitted_count(&self) -> usize {
        self.registers.lock().uncommitted.len()
    }

    /// Number of committed segments.
    pub fn committed_count(&self) -> usize {
        self.registers.lock().committed.len()
    }
}
