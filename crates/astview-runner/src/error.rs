//! Error types for the runner crate.

use astview_models::RequestId;
use thiserror::Error;

/// Errors that can occur while driving a tool run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The run was replaced by a newer one before it finished.
    #[error("run {0} was superseded")]
    Superseded(RequestId),

    /// The run's result was already returned.
    #[error("result for run {0} was already taken")]
    ResultTaken(RequestId),

    /// The tool executable could not be resolved.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
