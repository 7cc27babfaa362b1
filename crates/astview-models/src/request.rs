//! Analysis requests.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::ids::RequestId;

/// A snapshot of one source buffer, ready to be fed to the analysis tool.
///
/// Requests are never mutated. A newer request for the same viewer
/// supersedes the older one instead.
#[derive(Clone)]
pub struct AnalysisRequest {
    /// Unique identifier for this request.
    pub id: RequestId,
    /// File name passed to the tool as its last argument.
    pub source_file_name: String,
    /// Exact bytes written to the tool's standard input.
    pub source_bytes: Arc<[u8]>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl AnalysisRequest {
    /// Creates a new request with a fresh ID.
    pub fn new(source_file_name: impl Into<String>, source_bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: RequestId::new(),
            source_file_name: source_file_name.into(),
            source_bytes: source_bytes.into(),
            created_at: Utc::now(),
        }
    }

    /// Returns the source length in bytes.
    pub fn len(&self) -> usize {
        self.source_bytes.len()
    }

    /// Returns true if the source buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.source_bytes.is_empty()
    }
}

impl fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("id", &self.id)
            .field("source_file_name", &self.source_file_name)
            .field("source_len", &self.source_bytes.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_bytes_verbatim() {
        let source = "package main\n// héllo, 世界\n";
        let request = AnalysisRequest::new("main.go", source.as_bytes().to_vec());

        assert_eq!(request.source_file_name, "main.go");
        assert_eq!(&*request.source_bytes, source.as_bytes());
        assert_eq!(request.len(), source.len());
        assert!(!request.is_empty());
    }

    #[test]
    fn test_clones_share_bytes() {
        let request = AnalysisRequest::new("a.go", b"package a".to_vec());
        let clone = request.clone();

        assert_eq!(request.id, clone.id);
        assert!(Arc::ptr_eq(&request.source_bytes, &clone.source_bytes));
    }

    #[test]
    fn test_debug_omits_source_bytes() {
        let request = AnalysisRequest::new("secret.go", b"package secret".to_vec());
        let debug = format!("{:?}", request);

        assert!(debug.contains("source_len: 14"));
        assert!(!debug.contains("package secret"));
    }
}
