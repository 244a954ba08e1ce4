//! Persisted index metadata.
//!
//! The metadata file is human-inspectable JSON at a fixed well-known name
//! inside the index directory. It is loaded at writer construction and
//! rewritten atomically on every commit, so a reload resumes from exactly
//! the committed point.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::segment::SegmentMeta;
use crate::indexer::opstamp::Opstamp;
use crate::storage::Storage;

/// Fixed metadata filename inside the index directory.
pub const META_FILE_NAME: &str = "meta.json";

/// The persisted state of an index: its segments and last commit opstamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Committed segments, in registration order.
    pub segments: Vec<SegmentMeta>,
    /// Schema description, carried opaquely.
    #[serde(default)]
    pub schema: serde_json::Value,
    /// Opstamp of the last committed operation.
    pub opstamp: Opstamp,
}

impl IndexMeta {
    /// Metadata for a brand-new index.
    pub fn new() -> Self {
        IndexMeta {
            segments: Vec::new(),
            schema: serde_json::Value::Object(serde_json::Map::new()),
            opstamp: 0,
        }
    }

    /// Load metadata from storage.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let bytes = storage.atomic_read(META_FILE_NAME)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist metadata atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        storage.atomic_write(META_FILE_NAME, &bytes)
    }
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self::new()
    }
}
