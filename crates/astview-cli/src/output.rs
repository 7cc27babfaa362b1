//! Rendering analysis results to the terminal.

use std::io::{self, Write};

use serde::Serialize;

use astview_models::{AnalysisResult, ToolStatus};
use astview_viewer::AstViewer;

/// A viewer that prints outputs to stdout and errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalViewer {
    /// Print a separator line before each rendering.
    pub separator: bool,
}

impl AstViewer for TerminalViewer {
    fn on_analysis_output(&self, output: &[u8]) {
        let mut stdout = io::stdout().lock();
        if self.separator {
            let _ = writeln!(stdout, "----");
        }
        let _ = stdout.write_all(output);
        if !output.ends_with(b"\n") {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }

    fn on_analysis_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

/// JSON summary printed by `show --format json`.
#[derive(Debug, Serialize)]
pub struct ShowReport<'a> {
    /// File name the tool was invoked with.
    pub file: &'a str,
    /// Final status.
    pub status: &'a ToolStatus,
    /// Rendered AST, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Diagnostic, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the run.
    pub elapsed_ms: u64,
}

impl<'a> ShowReport<'a> {
    /// Builds a report from a finished run.
    pub fn new(result: &'a AnalysisResult) -> Self {
        let error = result.diagnostic();
        let output = error
            .is_none()
            .then(|| String::from_utf8_lossy(&result.output).into_owned());
        Self {
            file: &result.source_file_name,
            status: &result.status,
            output,
            error,
            elapsed_ms: result.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astview_models::RequestId;

    fn result(status: ToolStatus, output: &[u8], error: &[u8]) -> AnalysisResult {
        let finished_at = "2026-01-01T00:00:01.250Z".parse().unwrap();
        AnalysisResult {
            request_id: RequestId::from_string("req-1"),
            source_file_name: "main.go".to_string(),
            output: output.to_vec(),
            error: error.to_vec(),
            status,
            started_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            finished_at,
        }
    }

    #[test]
    fn test_report_success() {
        let r = result(ToolStatus::Succeeded, b"File main.go", b"");
        let json = serde_json::to_value(ShowReport::new(&r)).unwrap();

        assert_eq!(json["file"], "main.go");
        assert_eq!(json["status"]["kind"], "succeeded");
        assert_eq!(json["output"], "File main.go");
        assert!(json.get("error").is_none());
        assert_eq!(json["elapsed_ms"], 1250);
    }

    #[test]
    fn test_report_failure_hides_output() {
        let r = result(ToolStatus::Failed { code: Some(2) }, b"partial", b"parse error: line 1");
        let json = serde_json::to_value(ShowReport::new(&r)).unwrap();

        assert_eq!(json["status"]["code"], 2);
        assert_eq!(json["error"], "parse error: line 1");
        assert!(json.get("output").is_none());
    }
}
