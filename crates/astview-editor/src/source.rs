//! The editor interface consumed by the view controller.

use std::path::Path;

use crate::error::Result;

/// File path reported for a document that was never saved.
pub const UNTITLED: &str = "untitled";

/// What the AST viewer needs from an editor.
pub trait EditorSource {
    /// Reads a file's raw bytes.
    fn load_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Writes raw bytes to a file.
    fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Returns true if the buffer has unsaved changes.
    fn is_dirty(&self) -> bool;

    /// Returns the buffer's file path, or `UNTITLED`.
    fn current_file_path(&self) -> String;

    /// Returns the buffer contents as UTF-8.
    fn contents(&self) -> Vec<u8>;

    /// Returns the `(file name, source bytes)` pair for an analysis request.
    fn analysis_input(&self) -> (String, Vec<u8>) {
        (self.current_file_path(), self.contents())
    }
}
