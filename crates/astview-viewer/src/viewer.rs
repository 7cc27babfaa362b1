//! The viewer side of the controller.

/// Receives analysis notifications for display.
///
/// At most one notification is delivered per `update` call; under
/// supersession only the newest request produces one.
pub trait AstViewer: Send + Sync {
    /// Called with the tool's complete output after a successful run.
    fn on_analysis_output(&self, output: &[u8]);

    /// Called with a diagnostic message after a failed run.
    fn on_analysis_error(&self, message: &str);
}
