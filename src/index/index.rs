//! The public index aggregate.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::analysis::{Analyzer, StandardAnalyzer};
use crate::error::Result;
use crate::index::core::IndexCore;
use crate::index::meta::IndexMeta;
use crate::index::Document;
use crate::query::{self, SearchHit};
use crate::storage::Storage;

/// A searchable single-node index.
///
/// Wraps the unsynchronized [`IndexCore`] in a reader-writer lock: mutation
/// takes the write lock, queries take the read lock, so concurrent searches
/// never block each other. Optionally attached to a [`Storage`] backend for
/// persisted metadata; a detached index is purely in-memory.
#[derive(Debug)]
pub struct Index {
    analyzer: StandardAnalyzer,
    core: RwLock<IndexCore>,
    storage: Option<Arc<dyn Storage>>,
}

impl Index {
    /// Create a detached in-memory index.
    pub fn new() -> Result<Self> {
        Ok(Index {
            analyzer: StandardAnalyzer::new()?,
            core: RwLock::new(IndexCore::new()),
            storage: None,
        })
    }

    /// Create a new index in the given storage, writing fresh metadata.
    pub fn create(storage: Arc<dyn Storage>) -> Result<Self> {
        IndexMeta::new().save(storage.as_ref())?;
        Ok(Index {
            analyzer: StandardAnalyzer::new()?,
            core: RwLock::new(IndexCore::new()),
            storage: Some(storage),
        })
    }

    /// Open an existing index from storage, validating its metadata.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        IndexMeta::load(storage.as_ref())?;
        Ok(Index {
            analyzer: StandardAnalyzer::new()?,
            core: RwLock::new(IndexCore::new()),
            storage: Some(storage),
        })
    }

    /// The analyzer documents and queries are run through.
    pub fn analyzer(&self) -> &StandardAnalyzer {
        &self.analyzer
    }

    /// The attached storage backend, if any.
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Load persisted metadata from the attached storage.
    pub fn load_meta(&self) -> Result<IndexMeta> {
        match &self.storage {
            Some(storage) => IndexMeta::load(storage.as_ref()),
            None => Ok(IndexMeta::new()),
        }
    }

    /// Persist metadata to the attached storage. A detached index keeps its
    /// state in memory only.
    pub fn save_meta(&self, meta: &IndexMeta) -> Result<()> {
        match &self.storage {
            Some(storage) => meta.save(storage.as_ref()),
            None => Ok(()),
        }
    }

    /// Analyze and index a document, replacing any live document with the
    /// same id.
    pub fn add_document(&self, document: &Document) -> Result<()> {
        self.core.write().add_document(&self.analyzer, document)
    }

    /// Index a batch of documents in order.
    pub fn add_documents(&self, documents: &[Document]) -> Result<()> {
        let mut core = self.core.write();
        for document in documents {
            core.add_document(&self.analyzer, document)?;
        }
        Ok(())
    }

    /// Delete a document. Returns `false` for an unknown id.
    pub fn delete_document(&self, doc_id: u64) -> bool {
        self.core.write().delete_document(doc_id)
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> u64 {
        self.core.read().doc_count()
    }

    /// Total token count over live documents.
    pub fn token_count(&self) -> u64 {
        self.core.read().token_count()
    }

    /// Whether a document id is live.
    pub fn contains_doc(&self, doc_id: u64) -> bool {
        self.core.read().contains_doc(doc_id)
    }

    /// Ranked BM25 search. The query is analyzed with the index's own
    /// pipeline before scoring.
    pub fn search(&self, query_text: &str) -> Result<Vec<SearchHit>> {
        let terms = self.analyzer.analyze_terms(query_text)?;
        Ok(query::search(&self.core.read(), &terms))
    }

    /// Exact phrase search. Returns matching document ids in first-match
    /// order.
    pub fn phrase_search(&self, phrase: &str) -> Result<Vec<u64>> {
        let terms = self.analyzer.analyze_terms(phrase)?;
        Ok(query::phrase_search(&self.core.read(), &terms))
    }

    /// Run a closure under the read lock, for callers that need several
    /// consistent core reads.
    pub fn with_core<T>(&self, f: impl FnOnce(&IndexCore) -> T) -> T {
        f(&self.core.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn sample_index() -> Index {
        let index = Index::new().unwrap();
        index
            .add_documents(&[
                Document::new(1, "there is a white cat"),
                Document::new(2, "black hair cat"),
                Document::new(3, "black cat"),
                Document::new(4, "white dog"),
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_add_search_delete() {
        let index = sample_index();
        assert_eq!(index.doc_count(), 4);

        let hits = index.search("black cat").unwrap();
        assert_eq!(hits[0].doc_id, 3);

        assert!(index.delete_document(3));
        let hits = index.search("black cat").unwrap();
        assert!(hits.iter().all(|h| h.doc_id != 3));
    }

    #[test]
    fn test_phrase_search_through_index() {
        let index = sample_index();
        assert_eq!(index.phrase_search("black cat").unwrap(), vec![3]);
        assert_eq!(index.phrase_search("hair cat").unwrap(), vec![2]);
        assert!(index.phrase_search("").unwrap().is_empty());
    }

    #[test]
    fn test_create_then_open() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        {
            let index = Index::create(Arc::clone(&storage)).unwrap();
            let mut meta = index.load_meta().unwrap();
            meta.opstamp = 5;
            index.save_meta(&meta).unwrap();
        }

        let reopened = Index::open(storage).unwrap();
        assert_eq!(reopened.load_meta().unwrap().opstamp, 5);
    }

    #[test]
    fn test_open_missing_index_fails() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        assert!(Index::open(storage).is_err());
    }

    #[test]
    fn test_detached_index_meta_is_ephemeral() {
        let index = Index::new().unwrap();
        assert!(index.storage().is_none());
        assert_eq!(index.load_meta().unwrap(), IndexMeta::new());
        assert!(index.save_meta(&IndexMeta::new()).is_ok());
    }
}
