//! Lifecycle state of a tool run.

use serde::{Deserialize, Serialize};

/// Lifecycle of a single tool run.
///
/// `Idle -> Starting -> Running -> {Succeeded, Failed, SpawnError}`.
/// The three terminal states differ only in the result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    /// No run has been started.
    #[default]
    Idle,
    /// The process is being launched.
    Starting,
    /// The process is alive and its pipes are being serviced.
    Running,
    /// The process exited successfully.
    Succeeded,
    /// The process exited unsuccessfully, timed out, or was killed.
    Failed,
    /// The process could not be launched.
    SpawnError,
}

impl RunnerState {
    /// Returns true for the three terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunnerState::Succeeded | RunnerState::Failed | RunnerState::SpawnError
        )
    }

    /// Returns true while a process may be alive.
    pub fn is_active(&self) -> bool {
        matches!(self, RunnerState::Starting | RunnerState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunnerState::Idle.is_terminal());
        assert!(!RunnerState::Starting.is_terminal());
        assert!(!RunnerState::Running.is_terminal());
        assert!(RunnerState::Succeeded.is_terminal());
        assert!(RunnerState::Failed.is_terminal());
        assert!(RunnerState::SpawnError.is_terminal());
    }

    #[test]
    fn test_active_states() {
        assert!(RunnerState::Starting.is_active());
        assert!(RunnerState::Running.is_active());
        assert!(!RunnerState::Idle.is_active());
        assert!(!RunnerState::Failed.is_active());
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(RunnerState::default(), RunnerState::Idle);
    }
}
