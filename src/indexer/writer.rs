//! The concurrent write pipeline entry point.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::analysis::StandardAnalyzer;
use crate::error::{FalxError, Result};
use crate::index::{Document, Index};
use crate::indexer::operation::AddOperation;
use crate::indexer::opstamp::{Opstamp, Stamper};
use crate::indexer::segment_manager::SegmentManager;
use crate::indexer::segment_updater::SegmentUpdater;
use crate::indexer::segment_writer::SegmentWriter;

/// Hard ceiling on indexing worker threads.
pub const MAX_THREADS: usize = 8;
/// Heap reserved off the top of the configured budget before it is split
/// across workers.
pub const HEAP_MARGIN: usize = 1_000_000;
/// Minimum per-worker heap; construction fails below this.
pub const MIN_HEAP_PER_THREAD: usize = 3_000_000;
/// Bounded operation queue length. A full queue blocks `submit`, which is
/// the pipeline's only backpressure mechanism.
pub const OPERATION_QUEUE_CAPACITY: usize = 10_000;

/// Write pipeline configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Total indexing heap budget, margin included.
    pub heap_size_bytes: usize,
    /// Requested worker count; clamped to [`MAX_THREADS`] and the budget.
    pub max_threads: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            heap_size_bytes: 48_000_000,
            max_threads: MAX_THREADS,
        }
    }
}

/// Counts batches handed to the workers but not yet registered.
///
/// `commit` must not stamp out a commit point while an earlier-stamped batch
/// is still being built, so it waits here until the counter drains to zero.
#[derive(Debug, Default)]
struct PendingBatches {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingBatches {
    fn start(&self) {
        *self.count.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Multithreaded index writer.
///
/// Documents are stamped in submission order and queued as batches on a
/// bounded channel; each worker turns a batch into one or more immutable
/// segments with a private [`SegmentWriter`]. Batch failures are routed to
/// an error channel ([`IndexWriter::drain_errors`]) instead of killing the
/// worker, and `commit` waits for all in-flight batches before exposing a
/// commit point.
#[derive(Debug)]
pub struct IndexWriter {
    stamper: Arc<Stamper>,
    updater: Arc<SegmentUpdater>,
    sender: Option<Sender<Vec<AddOperation>>>,
    error_receiver: Receiver<FalxError>,
    pending: Arc<PendingBatches>,
    workers: Vec<JoinHandle<()>>,
    num_threads: usize,
    heap_per_thread: usize,
}

impl IndexWriter {
    /// Create a writer over an index with the default configuration.
    pub fn new(index: &Index) -> Result<Self> {
        Self::with_config(index, WriterConfig::default())
    }

    /// Create a writer over an index.
    ///
    /// Loads the persisted metadata (I/O failures abort construction), seeds
    /// the stamper from the committed opstamp, and sizes the worker pool:
    /// `min(num_cpus, max_threads, 8)` workers, reduced until each clears
    /// [`MIN_HEAP_PER_THREAD`] after the margin, erroring if even a single
    /// worker cannot be funded.
    pub fn with_config(index: &Index, config: WriterConfig) -> Result<Self> {
        let meta = index.load_meta()?;

        let available = config.heap_size_bytes.saturating_sub(HEAP_MARGIN);
        if available < MIN_HEAP_PER_THREAD {
            return Err(FalxError::resource_exhausted(format!(
                "heap budget {} cannot fund one worker ({} needed after {} margin)",
                config.heap_size_bytes,
                MIN_HEAP_PER_THREAD,
                HEAP_MARGIN
            )));
        }
        let mut num_threads = num_cpus::get()
            .min(config.max_threads.max(1))
            .min(MAX_THREADS);
        while num_threads > 1 && available / num_threads < MIN_HEAP_PER_THREAD {
            num_threads -= 1;
        }
        let heap_per_thread = available / num_threads;

        let stamper = Arc::new(Stamper::new(meta.opstamp));
        let manager = Arc::new(SegmentManager::from_committed(meta.segments, meta.opstamp));
        let updater = Arc::new(SegmentUpdater::new(manager, index.storage().cloned()));
        let pending = Arc::new(PendingBatches::default());

        let (sender, receiver) = bounded::<Vec<AddOperation>>(OPERATION_QUEUE_CAPACITY);
        let (error_sender, error_receiver) = unbounded::<FalxError>();

        let mut workers = Vec::with_capacity(num_threads);
        for worker_id in 0..num_threads {
            let receiver = receiver.clone();
            let analyzer = index.analyzer().clone();
            let updater = Arc::clone(&updater);
            let error_sender = error_sender.clone();
            let pending = Arc::clone(&pending);
            let handle = thread::Builder::new()
                .name(format!("falx-indexer-{worker_id}"))
                .spawn(move || {
                    for batch in receiver.iter() {
                        if let Err(err) = index_batch(&analyzer, &updater, batch, heap_per_thread)
                        {
                            let _ = error_sender.send(err);
                        }
                        pending.finish();
                    }
                })?;
            workers.push(handle);
        }

        Ok(IndexWriter {
            stamper,
            updater,
            sender: Some(sender),
            error_receiver,
            pending,
            workers,
            num_threads,
            heap_per_thread,
        })
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Heap budget granted to each worker.
    pub fn heap_per_thread(&self) -> usize {
        self.heap_per_thread
    }

    /// The segment updater, exposing registered segments and their manager.
    pub fn updater(&self) -> &SegmentUpdater {
        &self.updater
    }

    /// The most recently allocated opstamp.
    pub fn last_opstamp(&self) -> Opstamp {
        self.stamper.last()
    }

    /// Stamp the documents in order and enqueue them as one batch.
    ///
    /// Blocks while the operation queue is full. Returns the opstamp of the
    /// last document in the batch.
    pub fn submit(&self, documents: Vec<Document>) -> Result<Opstamp> {
        let batch: Vec<AddOperation> = documents
            .into_iter()
            .map(|document| AddOperation::new(self.stamper.stamp(), document))
            .collect();
        let Some(last) = batch.last().map(|op| op.opstamp) else {
            return Ok(self.stamper.last());
        };

        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| FalxError::index("index writer is closed"))?;
        self.pending.start();
        if sender.send(batch).is_err() {
            self.pending.finish();
            return Err(FalxError::index("operation queue is closed"));
        }
        Ok(last)
    }

    /// Commit everything submitted so far.
    ///
    /// Waits for every in-flight batch to be registered, then commits at the
    /// last stamped opstamp, so the commit never exposes a segment while an
    /// earlier-stamped operation is still being built. Returns the commit
    /// opstamp.
    pub fn commit(&self) -> Result<Opstamp> {
        self.pending.wait_idle();
        let target = self.stamper.last();
        self.updater.commit(target)?;
        Ok(target)
    }

    /// Take every batch failure reported by the workers since the last
    /// drain.
    pub fn drain_errors(&self) -> Vec<FalxError> {
        self.error_receiver.try_iter().collect()
    }

    /// Close the queue and join the workers.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        // Dropping the sender closes the queue; workers drain and exit.
        self.sender.take();
        let mut result = Ok(());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() && result.is_ok() {
                result = Err(FalxError::ThreadJoin(
                    "indexing worker panicked".to_string(),
                ));
            }
        }
        result
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Build one batch into segments, rolling over when a segment's heap
/// estimate crosses the worker budget.
fn index_batch(
    analyzer: &StandardAnalyzer,
    updater: &SegmentUpdater,
    batch: Vec<AddOperation>,
    heap_budget: usize,
) -> Result<()> {
    let mut writer = SegmentWriter::new(analyzer.clone(), heap_budget);
    for operation in batch {
        if writer.is_full() && writer.doc_count() > 0 {
            let (segment, max_opstamp) = writer.finish();
            updater.register_segment(segment, max_opstamp);
            writer = SegmentWriter::new(analyzer.clone(), heap_budget);
        }
        writer.index_operation(&operation)?;
    }
    if writer.doc_count() > 0 {
        let (segment, max_opstamp) = writer.finish();
        updater.register_segment(segment, max_opstamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::meta::IndexMeta;
    use crate::storage::{MemoryStorage, Storage};

    fn docs(range: std::ops::Range<u64>) -> Vec<Document> {
        range
            .map(|id| Document::new(id, format!("black cat number {id}")))
            .collect()
    }

    #[test]
    fn test_underfunded_budget_is_rejected() {
        let index = Index::new().unwrap();
        let config = WriterConfig {
            heap_size_bytes: HEAP_MARGIN + MIN_HEAP_PER_THREAD - 1,
            max_threads: 4,
        };
        let err = IndexWriter::with_config(&index, config).unwrap_err();
        assert!(matches!(err, FalxError::ResourceExhausted(_)));
    }

    #[test]
    fn test_budget_caps_the_worker_count() {
        let index = Index::new().unwrap();
        // Funds exactly one worker no matter how many CPUs are present.
        let config = WriterConfig {
            heap_size_bytes: HEAP_MARGIN + MIN_HEAP_PER_THREAD,
            max_threads: MAX_THREADS,
        };
        let writer = IndexWriter::with_config(&index, config).unwrap();
        assert_eq!(writer.num_threads(), 1);
        assert!(writer.heap_per_thread() >= MIN_HEAP_PER_THREAD);
    }

    #[test]
    fn test_thread_count_never_exceeds_the_ceiling() {
        let index = Index::new().unwrap();
        let config = WriterConfig {
            heap_size_bytes: 1_000_000_000,
            max_threads: 64,
        };
        let writer = IndexWriter::with_config(&index, config).unwrap();
        assert!(writer.num_threads() <= MAX_THREADS);
    }

    #[test]
    fn test_submit_and_commit() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let index = Index::create(Arc::clone(&storage)).unwrap();
        let writer = IndexWriter::new(&index).unwrap();

        let last = writer.submit(docs(1..6)).unwrap();
        assert_eq!(last, 5);

        let committed_at = writer.commit().unwrap();
        assert_eq!(committed_at, 5);
        assert!(writer.drain_errors().is_empty());

        let meta = IndexMeta::load(storage.as_ref()).unwrap();
        assert_eq!(meta.opstamp, 5);
        let total_docs: u32 = meta.segments.iter().map(|s| s.max_doc).sum();
        assert_eq!(total_docs, 5);

        writer.close().unwrap();
    }

    #[test]
    fn test_empty_submit_is_a_noop() {
        let index = Index::new().unwrap();
        let writer = IndexWriter::new(&index).unwrap();
        assert_eq!(writer.submit(Vec::new()).unwrap(), 0);
        assert_eq!(writer.commit().unwrap(), 0);
    }

    #[test]
    fn test_commits_are_cumulative() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let index = Index::create(Arc::clone(&storage)).unwrap();
        let writer = IndexWriter::new(&index).unwrap();

        writer.submit(docs(1..3)).unwrap();
        let first = writer.commit().unwrap();
        assert_eq!(first, 2);

        writer.submit(docs(3..4)).unwrap();
        let second = writer.commit().unwrap();
        assert_eq!(second, 3);

        let meta = IndexMeta::load(storage.as_ref()).unwrap();
        let total_docs: u32 = meta.segments.iter().map(|s| s.max_doc).sum();
        assert_eq!(total_docs, 3);
    }

    #[test]
    fn test_opstamps_resume_after_reopen() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        {
            let index = Index::create(Arc::clone(&storage)).unwrap();
            let writer = IndexWriter::new(&index).unwrap();
            writer.submit(docs(1..4)).unwrap();
            assert_eq!(writer.commit().unwrap(), 3);
        }

        let index = Index::open(storage).unwrap();
        let writer = IndexWriter::new(&index).unwrap();
        assert_eq!(writer.last_opstamp(), 3);
        assert_eq!(writer.submit(docs(4..5)).unwrap(), 4);
    }

    #[test]
    fn test_tiny_worker_budget_rolls_segments_over() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let index = Index::create(Arc::clone(&storage)).unwrap();
        // One worker funded at exactly the minimum; each document comfortably
        // exceeds nothing, so rollover is driven purely by volume.
        let config = WriterConfig {
            heap_size_bytes: HEAP_MARGIN + MIN_HEAP_PER_THREAD,
            max_threads: 1,
        };
        let writer = IndexWriter::with_config(&index, config).unwrap();

        writer.submit(docs(1..101)).unwrap();
        writer.commit().unwrap();
        assert!(writer.drain_errors().is_empty());

        let meta = IndexMeta::load(storage.as_ref()).unwrap();
        let total_docs: u32 = meta.segments.iter().map(|s| s.max_doc).sum();
        assert_eq!(total_docs, 100);
    }
}
