//! Error types for the viewer crate.

use thiserror::Error;

/// Errors that can occur in the view controller.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The controller's driver task is no longer running.
    #[error("view controller is stopped")]
    Stopped,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
