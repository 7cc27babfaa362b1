//! Atomic file writes for crash-safe saves.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{EditorError, Result};

/// Writes data to a file atomically.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over the target, so the file is never left partially written.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| EditorError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    // Same directory, so the rename stays on one filesystem.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |source| EditorError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp_file.write_all(data).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;
    temp_file
        .persist(path)
        .map_err(|e| write_error(e.error))?;

    Ok(())
}
