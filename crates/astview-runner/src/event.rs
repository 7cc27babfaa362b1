//! Runner events.

use astview_models::{RequestId, ToolStatus};

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// The tool process was launched.
    Started {
        /// Request being served.
        request_id: RequestId,
        /// OS process id, if still known.
        pid: Option<u32>,
    },
    /// A chunk of stdout arrived.
    Stdout {
        /// Request being served.
        request_id: RequestId,
        /// The bytes, in arrival order.
        chunk: Vec<u8>,
    },
    /// A chunk of stderr arrived.
    Stderr {
        /// Request being served.
        request_id: RequestId,
        /// The bytes, in arrival order.
        chunk: Vec<u8>,
    },
    /// The run reached its terminal state.
    Finished {
        /// Request being served.
        request_id: RequestId,
        /// Final status.
        status: ToolStatus,
    },
    /// The run was killed because a newer run replaced it.
    Superseded {
        /// Request that was dropped.
        request_id: RequestId,
    },
}

impl RunnerEvent {
    /// Returns the request ID associated with this event.
    pub fn request_id(&self) -> &RequestId {
        match self {
            RunnerEvent::Started { request_id, .. } => request_id,
            RunnerEvent::Stdout { request_id, .. } => request_id,
            RunnerEvent::Stderr { request_id, .. } => request_id,
            RunnerEvent::Finished { request_id, .. } => request_id,
            RunnerEvent::Superseded { request_id } => request_id,
        }
    }

    /// Returns true if this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunnerEvent::Finished { .. } | RunnerEvent::Superseded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_request_id() {
        let request_id = RequestId::from_string("req-1");

        let event = RunnerEvent::Started {
            request_id: request_id.clone(),
            pid: Some(42),
        };
        assert_eq!(event.request_id(), &request_id);

        let event = RunnerEvent::Stdout {
            request_id: request_id.clone(),
            chunk: b"ast".to_vec(),
        };
        assert_eq!(event.request_id(), &request_id);

        let event = RunnerEvent::Superseded {
            request_id: request_id.clone(),
        };
        assert_eq!(event.request_id(), &request_id);
    }

    #[test]
    fn test_event_is_terminal() {
        let request_id = RequestId::from_string("req-1");

        let event = RunnerEvent::Stderr {
            request_id: request_id.clone(),
            chunk: b"warning".to_vec(),
        };
        assert!(!event.is_terminal());

        let event = RunnerEvent::Finished {
            request_id,
            status: ToolStatus::Succeeded,
        };
        assert!(event.is_terminal());
    }
}
