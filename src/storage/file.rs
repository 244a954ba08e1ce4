//! Filesystem-backed storage.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{FalxError, Result};
use crate::storage::{Storage, StorageOutput};

/// Storage rooted at a directory on the local filesystem.
///
/// Atomic writes go through a sibling temporary file followed by a rename,
/// so a concurrent reader sees either the previous contents or the new
/// contents in full.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `directory`, creating it if missing.
    ///
    /// Fails at construction if the path exists but is not a directory; a
    /// bad target path is a configuration error, not a runtime condition.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            fs::create_dir_all(&directory)
                .map_err(|e| FalxError::storage(format!("failed to create directory: {e}")))?;
        }
        if !directory.is_dir() {
            return Err(FalxError::storage(format!(
                "path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage { directory })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(self.file_path(name))?;
        Ok(Box::new(file))
    }

    fn atomic_read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.file_path(name))?)
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.file_path(name))?;
        Ok(Box::new(FileOutput {
            writer: BufWriter::new(file),
        }))
    }

    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()> {
        let tmp_path = self.file_path(&format!("{name}.tmp"));
        let final_path = self.file_path(name);

        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(data)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        match fs::metadata(self.file_path(name)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, name: &str) -> Result<()> {
        fs::remove_file(self.file_path(name))?;
        Ok(())
    }
}

/// Buffered file writer with explicit durability.
#[derive(Debug)]
struct FileOutput {
    writer: BufWriter<File>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.atomic_write("meta.json", b"{}").unwrap();
        assert_eq!(storage.atomic_read("meta.json").unwrap(), b"{}");
        assert!(storage.exists("meta.json").unwrap());
        assert!(!storage.exists("missing.json").unwrap());
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.atomic_write("meta.json", b"old").unwrap();
        storage.atomic_write("meta.json", b"new").unwrap();
        assert_eq!(storage.atomic_read("meta.json").unwrap(), b"new");
    }

    #[test]
    fn test_create_output_and_open_input() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        let mut output = storage.create_output("data.bin").unwrap();
        output.write_all(b"postings").unwrap();
        output.flush_and_sync().unwrap();

        let mut input = storage.open_input("data.bin").unwrap();
        let mut contents = Vec::new();
        input.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"postings");
    }

    #[test]
    fn test_rejects_non_directory_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not_a_dir");
        std::fs::write(&file_path, b"x").unwrap();

        assert!(FileStorage::new(&file_path).is_err());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.atomic_write("gone.bin", b"x").unwrap();
        storage.delete("gone.bin").unwrap();
        assert!(!storage.exists("gone.bin").unwrap());
    }
}
