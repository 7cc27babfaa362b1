//! Viewer events.

use astview_models::{AnalysisOutcome, AnalysisResult, RequestId};

use crate::viewer::AstViewer;

/// Notifications published to viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The tool produced an AST rendering.
    AnalysisOutput {
        /// Request that produced the output.
        request_id: RequestId,
        /// File name the tool was invoked with.
        file_name: String,
        /// Complete stdout of the run.
        output: Vec<u8>,
    },
    /// The run failed.
    AnalysisError {
        /// Request that failed.
        request_id: RequestId,
        /// File name the tool was invoked with.
        file_name: String,
        /// Diagnostic message.
        message: String,
    },
}

impl ViewerEvent {
    /// Builds the event a viewer should see for a finished run.
    pub fn from_result(result: &AnalysisResult) -> Self {
        let request_id = result.request_id.clone();
        let file_name = result.source_file_name.clone();
        match result.outcome() {
            AnalysisOutcome::Output(output) => ViewerEvent::AnalysisOutput {
                request_id,
                file_name,
                output,
            },
            AnalysisOutcome::Error(message) => ViewerEvent::AnalysisError {
                request_id,
                file_name,
                message,
            },
        }
    }

    /// Returns the request ID associated with this event.
    pub fn request_id(&self) -> &RequestId {
        match self {
            ViewerEvent::AnalysisOutput { request_id, .. } => request_id,
            ViewerEvent::AnalysisError { request_id, .. } => request_id,
        }
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, ViewerEvent::AnalysisError { .. })
    }

    /// Delivers this event to a viewer.
    pub fn dispatch(&self, viewer: &dyn AstViewer) {
        match self {
            ViewerEvent::AnalysisOutput { output, .. } => viewer.on_analysis_output(output),
            ViewerEvent::AnalysisError { message, .. } => viewer.on_analysis_error(message),
        }
    }
}
