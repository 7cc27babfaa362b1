//! Source documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::atomic::atomic_write;
use crate::error::{EditorError, Result};
use crate::source::{EditorSource, UNTITLED};

/// Counter for untitled document names.
static UNTITLED_SEQUENCE: AtomicUsize = AtomicUsize::new(1);

/// What to do with unsaved changes when a document closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseDecision {
    /// Save to the current path.
    Save,
    /// Save to a new path.
    SaveAs(PathBuf),
    /// Drop the changes.
    Discard,
    /// Keep the document open.
    Cancel,
}

/// A text buffer backed by an optional file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Canonical path, `None` until first saved or loaded.
    path: Option<PathBuf>,
    /// Name shown while the document is untitled.
    untitled_name: String,
    /// Current text.
    text: String,
    /// Whether `text` differs from what is on disk.
    dirty: bool,
    /// Bytes last read from or written to `path`.
    disk_bytes: Vec<u8>,
}

impl SourceDocument {
    /// Creates an empty untitled document named `document<N>.<extension>`.
    pub fn new_untitled(extension: &str) -> Self {
        let n = UNTITLED_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self {
            path: None,
            untitled_name: format!("document{}.{}", n, extension),
            text: String::new(),
            dirty: false,
            disk_bytes: Vec::new(),
        }
    }

    /// Opens a file into a new document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut doc = Self::new_untitled("txt");
        doc.load_file(path)?;
        Ok(doc)
    }

    /// Replaces the buffer with a file's contents and adopts its path.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.load_bytes(path)?;
        self.text = decode(path, bytes.clone());
        self.disk_bytes = bytes;
        self.set_current_file(path);
        debug!(path = %path.display(), len = self.text.len(), "document loaded");
        Ok(())
    }

    /// Re-reads the document from its current path.
    pub fn reload(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| EditorError::Untitled(self.untitled_name.clone()))?;
        self.load_file(path)
    }

    /// Saves to the current path.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Untitled` if the document has no path yet;
    /// use `save_as` instead.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| EditorError::Untitled(self.untitled_name.clone()))?;
        self.save_as(path)
    }

    /// Saves to `path` and adopts it as the document's path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save_bytes(path, self.text.as_bytes())?;
        self.disk_bytes = self.text.as_bytes().to_vec();
        self.set_current_file(path);
        debug!(path = %path.display(), len = self.text.len(), "document saved");
        Ok(())
    }

    /// Replaces the text, marking the document dirty if it changed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.dirty = true;
        }
    }

    /// Returns the current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the bytes last read from or written to disk.
    ///
    /// Differs from `contents` when the file was not valid UTF-8.
    pub fn disk_bytes(&self) -> &[u8] {
        &self.disk_bytes
    }

    /// Returns the canonical path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true if the document was never saved or loaded.
    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    /// Returns the bare file name, or the untitled name.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.untitled_name.clone())
    }

    /// Returns the window title: the display name, starred when dirty.
    pub fn title(&self) -> String {
        if self.dirty {
            format!("{}*", self.display_name())
        } else {
            self.display_name()
        }
    }

    /// Decides whether the document may close.
    ///
    /// `decide` is only consulted when there are unsaved changes, and
    /// receives the display name. Returns `Ok(false)` if closing was
    /// cancelled.
    pub fn close<F>(&mut self, decide: F) -> Result<bool>
    where
        F: FnOnce(&str) -> CloseDecision,
    {
        if !self.dirty {
            return Ok(true);
        }
        match decide(&self.display_name()) {
            CloseDecision::Save => self.save().map(|_| true),
            CloseDecision::SaveAs(path) => self.save_as(path).map(|_| true),
            CloseDecision::Discard => Ok(true),
            CloseDecision::Cancel => Ok(false),
        }
    }

    fn set_current_file(&mut self, path: &Path) {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.path = Some(canonical);
        self.dirty = false;
    }
}

impl EditorSource for SourceDocument {
    fn load_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|source| EditorError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        atomic_write(path, bytes)
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn current_file_path(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    fn contents(&self) -> Vec<u8> {
        self.text.as_bytes().to_vec()
    }
}

fn decode(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), "file is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
