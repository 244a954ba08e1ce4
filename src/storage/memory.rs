//! In-memory storage for tests and transient indexes.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{FalxError, Result};
use crate::storage::{Storage, StorageOutput};

/// A storage backend keeping every file in a shared map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<AHashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let data = self.atomic_read(name)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn atomic_read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| FalxError::storage(format!("file not found: {name}")))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.files.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.files.lock().contains_key(name))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.files
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| FalxError::storage(format!("file not found: {name}")))
    }
}

/// Buffered writer that publishes the file on sync.
#[derive(Debug)]
struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: Arc<Mutex<AHashMap<String, Vec<u8>>>>,
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.files
            .lock()
            .insert(self.name.clone(), self.buffer.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let storage = MemoryStorage::new();
        storage.atomic_write("a.json", b"abc").unwrap();

        assert_eq!(storage.atomic_read("a.json").unwrap(), b"abc");
        assert!(storage.exists("a.json").unwrap());
        assert!(!storage.exists("b.json").unwrap());
        assert_eq!(storage.file_count(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error_on_read() {
        let storage = MemoryStorage::new();
        assert!(storage.atomic_read("nope").is_err());
        assert!(storage.open_input("nope").is_err());
    }

    #[test]
    fn test_output_is_published_on_sync() {
        let storage = MemoryStorage::new();
        let mut output = storage.create_output("buf.bin").unwrap();
        output.write_all(b"xyz").unwrap();

        assert!(!storage.exists("buf.bin").unwrap());
        output.flush_and_sync().unwrap();
        assert_eq!(storage.atomic_read("buf.bin").unwrap(), b"xyz");
    }
}
