//! Segment registration and commit persistence.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::Result;
use crate::index::meta::IndexMeta;
use crate::index::segment::{Segment, SegmentId, SegmentMeta};
use crate::indexer::opstamp::Opstamp;
use crate::indexer::segment_manager::SegmentManager;
use crate::indexer::segment_register::SegmentEntry;

/// Applies segment state changes on behalf of the worker pool.
///
/// Registration is constant-time metadata work under the manager lock; the
/// expensive part of indexing already happened in the worker's private
/// [`SegmentWriter`](crate::indexer::segment_writer::SegmentWriter). Commit
/// moves eligible segments to the committed register and persists the
/// resulting [`IndexMeta`] atomically, so a crash between commits leaves the
/// previous metadata intact.
#[derive(Debug)]
pub struct SegmentUpdater {
    manager: Arc<SegmentManager>,
    storage: Option<Arc<dyn crate::storage::Storage>>,
    segments: Mutex<AHashMap<SegmentId, Arc<Segment>>>,
}

impl SegmentUpdater {
    /// Create an updater over the given manager and optional storage.
    pub fn new(
        manager: Arc<SegmentManager>,
        storage: Option<Arc<dyn crate::storage::Storage>>,
    ) -> Self {
        SegmentUpdater {
            manager,
            storage,
            segments: Mutex::new(AHashMap::new()),
        }
    }

    /// Register a freshly built segment as uncommitted.
    pub fn register_segment(&self, segment: Segment, max_opstamp: Opstamp) {
        let entry = SegmentEntry::new(segment.meta().clone(), max_opstamp);
        let segment_id = segment.meta().segment_id.clone();
        self.segments.lock().insert(segment_id, Arc::new(segment));
        self.manager.register_uncommitted(entry);
    }

    /// Commit at `target`: expose every registered segment stamped at or
    /// below it and persist the updated metadata.
    pub fn commit(&self, target: Opstamp) -> Result<Vec<SegmentMeta>> {
        let committed = self.manager.commit(target);
        if let Some(storage) = &self.storage {
            let mut meta = IndexMeta::new();
            meta.segments = committed.clone();
            meta.opstamp = target;
            meta.save(storage.as_ref())?;
        }
        Ok(committed)
    }

    /// The segment data for a registered segment, if still held.
    pub fn segment(&self, segment_id: &SegmentId) -> Option<Arc<Segment>> {
        self.segments.lock().get(segment_id).cloned()
    }

    /// The shared segment manager.
    pub fn manager(&self) -> &SegmentManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;
    use crate::index::meta::IndexMeta;
    use crate::index::Document;
    use crate::indexer::operation::AddOperation;
    use crate::indexer::segment_writer::SegmentWriter;
    use crate::storage::{MemoryStorage, Storage};

    fn build_segment(opstamp: Opstamp, doc: Document) -> (Segment, Opstamp) {
        let mut writer = SegmentWriter::new(StandardAnalyzer::new().unwrap(), 1 << 20);
        writer.index_operation(&AddOperation::new(opstamp, doc)).unwrap();
        writer.finish()
    }

    #[test]
    fn test_commit_persists_metadata() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let updater = SegmentUpdater::new(Arc::new(SegmentManager::new()), Some(Arc::clone(&storage)));

        let (segment, max_opstamp) = build_segment(3, Document::new(1, "black cat"));
        updater.register_segment(segment, max_opstamp);

        let committed = updater.commit(3).unwrap();
        assert_eq!(committed.len(), 1);

        let meta = IndexMeta::load(storage.as_ref()).unwrap();
        assert_eq!(meta.opstamp, 3);
        assert_eq!(meta.segments, committed);
    }

    #[test]
    fn test_commit_excludes_later_stamped_segments() {
        let updater = SegmentUpdater::new(Arc::new(SegmentManager::new()), None);

        let (early, early_stamp) = build_segment(2, Document::new(1, "black cat"));
        let (late, late_stamp) = build_segment(8, Document::new(2, "white dog"));
        updater.register_segment(early, early_stamp);
        updater.register_segment(late, late_stamp);

        let committed = updater.commit(5).unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(updater.manager().uncommitted_count(), 1);
    }

    #[test]
    fn test_registered_segment_data_is_retrievable() {
        let updater = SegmentUpdater::new(Arc::new(SegmentManager::new()), None);
        let (segment, max_opstamp) = build_segment(1, Document::new(9, "black cat"));
        let id = segment.meta().segment_id.clone();
        updater.register_segment(segment, max_opstamp);

        let held = updater.segment(&id).unwrap();
        assert!(held.core().contains_doc(9));
        assert!(updater.segment(&SegmentId::new()).is_none());
    }
}
