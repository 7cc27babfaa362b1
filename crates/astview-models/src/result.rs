//! Finalized analysis results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RequestId;
use crate::state::RunnerState;

/// How a tool run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolStatus {
    /// The tool exited with status 0.
    Succeeded,
    /// The tool exited non-zero or reported errors.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    Failed { code: Option<i32> },
    /// The tool could not be launched.
    SpawnError { message: String },
    /// The tool did not finish in time and was killed.
    TimedOut { after: Duration },
}

impl ToolStatus {
    /// Returns the terminal lifecycle state for this status.
    pub fn state(&self) -> RunnerState {
        match self {
            ToolStatus::Succeeded => RunnerState::Succeeded,
            ToolStatus::Failed { .. } | ToolStatus::TimedOut { .. } => RunnerState::Failed,
            ToolStatus::SpawnError { .. } => RunnerState::SpawnError,
        }
    }

    /// Returns true if the run succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ToolStatus::Succeeded)
    }
}

/// What a viewer should show for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Rendered AST output.
    Output(Vec<u8>),
    /// Diagnostic message.
    Error(String),
}

/// The immutable result of running the analysis tool once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Request this result answers.
    pub request_id: RequestId,
    /// File name the tool was invoked with.
    pub source_file_name: String,
    /// Everything the tool wrote to stdout, in arrival order.
    pub output: Vec<u8>,
    /// Everything the tool wrote to stderr, in arrival order.
    pub error: Vec<u8>,
    /// How the run ended.
    pub status: ToolStatus,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run reached its terminal state.
    pub finished_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Returns the elapsed wall time of the run.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Returns the diagnostic message for a failed run.
    ///
    /// Priority: spawn error text, then captured stderr, then the exit
    /// status. Returns `None` for a successful run.
    pub fn diagnostic(&self) -> Option<String> {
        let fallback = match &self.status {
            ToolStatus::Succeeded => return None,
            ToolStatus::SpawnError { message } => return Some(message.clone()),
            ToolStatus::Failed { code: Some(code) } => format!("tool exited with status {}", code),
            ToolStatus::Failed { code: None } => "tool terminated by signal".to_string(),
            ToolStatus::TimedOut { after } => {
                format!("tool timed out after {}ms", after.as_millis())
            }
        };

        let stderr = String::from_utf8_lossy(&self.error);
        let stderr = stderr.trim_end();
        if stderr.is_empty() {
            Some(fallback)
        } else {
            Some(stderr.to_string())
        }
    }

    /// Converts the result into what a viewer should display.
    ///
    /// The stdout of a failed run is never surfaced.
    pub fn outcome(&self) -> AnalysisOutcome {
        match self.diagnostic() {
            None => AnalysisOutcome::Output(self.output.clone()),
            Some(message) => AnalysisOutcome::Error(message),
        }
    }
}
