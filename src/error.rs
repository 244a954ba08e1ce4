//! Error types for the falx library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`FalxError`] enum. Expected steady-state misses (an unknown term in a
//! postings lookup, deleting a document id that is not live) are *not*
//! errors; they are reported through sentinel values or `bool` returns by
//! the APIs concerned.

use std::io;

use thiserror::Error;

/// The main error type for falx operations.
#[derive(Error, Debug)]
pub enum FalxError {
    /// I/O errors (file operations, directory access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Query-related errors
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource exhausted (e.g. insufficient heap budget per thread)
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Worker thread join errors
    #[error("Thread join error: {0}")]
    ThreadJoin(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`FalxError`].
pub type Result<T> = std::result::Result<T, FalxError>;

impl FalxError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        FalxError::Index(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        FalxError::Analysis(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        FalxError::Query(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        FalxError::Storage(msg.into())
    }

    /// Create a new resource-exhausted error.
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        FalxError::ResourceExhausted(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FalxError::Other(msg.into())
    }
}
