//! Source documents for the editor side of astview.
//!
//! The view controller only needs `(file name, bytes)` pairs; this crate
//! supplies them from a `SourceDocument`, which tracks the file path, the
//! text, and whether the text has unsaved changes. Saves are atomic (write
//! to a temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use astview_editor::{EditorSource, SourceDocument};
//!
//! let mut doc = SourceDocument::open("src/main.go").unwrap();
//! doc.set_text("package main\n\nfunc main() {}\n");
//! assert!(doc.is_dirty());
//!
//! let (file_name, bytes) = doc.analysis_input();
//! println!("{} ({} bytes)", file_name, bytes.len());
//!
//! doc.save().unwrap();
//! ```

pub mod atomic;
pub mod document;
pub mod error;
pub mod source;

pub use document::{CloseDecision, SourceDocument};
pub use error::{EditorError, Result};
pub use source::{EditorSource, UNTITLED};
