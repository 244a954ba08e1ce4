//! The concurrent segment write pipeline.
//!
//! Writes flow through a single total order of opstamps: `submit` stamps
//! documents, worker threads build immutable segments from batches, and
//! `commit` atomically exposes every segment whose operations are all at or
//! below the commit opstamp.

pub mod operation;
pub mod opstamp;
pub mod segment_manager;
pub mod segment_register;
pub mod segment_updater;
pub mod segment_writer;
pub mod writer;

pub use operation::AddOperation;
pub use opstamp::{Opstamp, Stamper};
pub use segment_manager::SegmentManager;
pub use segment_register::{SegmentEntry, SegmentRegister};
pub use segment_updater::SegmentUpdater;
pub use segment_writer::SegmentWriter;
pub use writer::{IndexWriter, WriterConfig};
