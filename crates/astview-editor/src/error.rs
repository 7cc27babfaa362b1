//! Error types for document operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving documents.
#[derive(Error, Debug)]
pub enum EditorError {
    /// Failed to read from file system.
    #[error("cannot read file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to file system.
    #[error("cannot write file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document has never been saved and has no path.
    #[error("document '{0}' has no file path")]
    Untitled(String),
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, EditorError>;
