//! Storage abstraction for index files.
//!
//! The index core only needs a small directory-like surface: streamed and
//! atomic reads, buffered and atomic writes, existence checks, and deletes.
//! `exists` distinguishes "not found" (returns `Ok(false)`) from a genuine
//! I/O failure (returns `Err`).

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::io::{Read, Write};

use crate::error::Result;

/// A writer into storage that can be flushed to make the bytes durable.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered bytes and sync them to the backend.
    fn flush_and_sync(&mut self) -> Result<()>;
}

/// A trait for storage backends holding index files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for streamed reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>>;

    /// Read a whole file at once.
    fn atomic_read(&self, name: &str) -> Result<Vec<u8>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Replace a file's contents atomically: readers observe either the old
    /// bytes or the new bytes, never a partial write.
    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Whether a file exists. Not-found is `Ok(false)`; only genuine I/O
    /// failures are errors.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Delete a file.
    fn delete(&self, name: &str) -> Result<()>;
}
