//! Bookkeeping for sets of built segments.

use ahash::AHashMap;

use crate::index::segment::{SegmentId, SegmentMeta};
use crate::indexer::opstamp::Opstamp;

/// A built segment's metadata plus the highest opstamp it contains.
///
/// The opstamp high-water mark is what commit eligibility is decided on: a
/// commit at opstamp N may only expose segments whose every operation is
/// stamped at or below N.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    meta: SegmentMeta,
    max_opstamp: Opstamp,
}

impl SegmentEntry {
    /// Create an entry for a built segment.
    pub fn new(meta: SegmentMeta, max_opstamp: Opstamp) -> Self {
        SegmentEntry { meta, max_opstamp }
    }

    /// The segment's metadata.
    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    /// The segment's id.
    pub fn segment_id(&self) -> &SegmentId {
        &self.meta.segment_id
    }

    /// The highest opstamp among the segment's operations.
    pub fn max_opstamp(&self) -> Opstamp {
        self.max_opstamp
    }
}

/// A keyed set of segment entries.
#[derive(Debug, Default)]
pub struct SegmentRegister {
    entries: AHashMap<SegmentId, SegmentEntry>,
}

impl SegmentRegister {
    /// Create an empty register.
    pub fn new() -> Self {
        SegmentRegister::default()
    }

    /// Add an entry, replacing any entry with the same segment id.
    pub fn add(&mut self, entry: SegmentEntry) {
        self.entries.insert(entry.segment_id().clone(), entry);
    }

    /// Remove an entry by segment id.
    pub fn remove(&mut self, segment_id: &SegmentId) -> Option<SegmentEntry> {
        self.entries.remove(segment_id)
    }

    /// Whether the register holds an entry for the given segment id.
    pub fn contains(&self, segment_id: &SegmentId) -> bool {
        self.entries.contains_key(segment_id)
    }

    /// Number of registered segments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the register is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for every registered segment, in deterministic order
    /// (ascending max opstamp, segment id as tie-break).
    pub fn metas(&self) -> Vec<SegmentMeta> {
        let mut entries: Vec<&SegmentEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.max_opstamp
                .cmp(&b.max_opstamp)
                .then_with(|| a.segment_id().as_str().cmp(b.segment_id().as_str()))
        });
        entries.into_iter().map(|e| e.meta.clone()).collect()
    }

    /// Remove and return every entry whose max opstamp is at or below
    /// `target`, in ascending opstamp order.
    pub fn drain_through(&mut self, target: Opstamp) -> Vec<SegmentEntry> {
        let eligible: Vec<SegmentId> = self
            .entries
            .values()
            .filter(|entry| entry.max_opstamp <= target)
            .map(|entry| entry.segment_id().clone())
            .collect();

        let mut drained: Vec<SegmentEntry> = eligible
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect();
        drained.sort_by_key(|entry| entry.max_opstamp);
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(max_opstamp: Opstamp) -> SegmentEntry {
        SegmentEntry::new(SegmentMeta::new(SegmentId::new(), 1), max_opstamp)
    }

    #[test]
    fn test_add_remove_contains() {
        let mut register = SegmentRegister::new();
        let e = entry(3);
        let id = e.segment_id().clone();

        register.add(e);
        assert!(register.contains(&id));
        assert_eq!(register.len(), 1);

        assert!(register.remove(&id).is_some());
        assert!(register.is_empty());
        assert!(register.remove(&id).is_none());
    }

    #[test]
    fn test_drain_through_takes_only_eligible_entries() {
        let mut register = SegmentRegister::new();
        register.add(entry(2));
        register.add(entry(5));
        register.add(entry(9));

        let drained = register.drain_through(5);
        let stamps: Vec<Opstamp> = drained.iter().map(|e| e.max_opstamp()).collect();
        assert_eq!(stamps, vec![2, 5]);

        assert_eq!(register.len(), 1);
        assert_eq!(register.metas().len(), 1);
    }

    #[test]
    fn test_metas_are_in_opstamp_order() {
        let mut register = SegmentRegister::new();
        register.add(entry(7));
        register.add(entry(1));
        register.add(entry(4));

        let metas = register.metas();
        assert_eq!(metas.len(), 3);
        // Order must be reproducible across calls.
        assert_eq!(register.metas(), metas);
    }
}
