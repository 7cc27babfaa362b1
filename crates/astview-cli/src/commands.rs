//! Command handlers for CLI subcommands.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use astview_editor::{EditorSource, SourceDocument};
use astview_models::AnalysisResult;
use astview_viewer::{AstViewController, ViewerConfig};

use crate::cli::{Commands, OutputFormat};
use crate::output::{ShowReport, TerminalViewer};

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a CLI command.
pub async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Show { file, tool, format } => {
            let config = tool.viewer_config()?;
            let result = cmd_show(&file, config, format, &mut io::stdout()).await?;
            match result.diagnostic() {
                None => Ok(()),
                Some(message) => Err(message.into()),
            }
        }
        Commands::Watch {
            file,
            tool,
            interval_ms,
            debounce_ms,
        } => {
            let mut config = tool.viewer_config()?;
            if let Some(ms) = debounce_ms {
                config = config.with_debounce(Duration::from_millis(ms));
            }
            cmd_watch(&file, config, Duration::from_millis(interval_ms.max(1))).await
        }
    }
}

/// Analyze `file` once and write the result to `out`.
pub async fn cmd_show<W: Write>(
    file: &Path,
    config: ViewerConfig,
    format: OutputFormat,
    out: &mut W,
) -> Result<AnalysisResult> {
    let doc = SourceDocument::open(file)?;
    let (file_name, source) = doc.analysis_input();

    let mut controller = AstViewController::new(config);
    let mut events = controller.subscribe();
    let request_id = controller.update(file_name, source)?;

    loop {
        let event = events.recv().await?;
        if event.request_id() == &request_id {
            break;
        }
    }
    let result = controller
        .last_result()
        .await
        .ok_or("analysis finished without a result")?;
    controller.shutdown().await?;

    match format {
        OutputFormat::Raw => {
            if result.status.is_success() {
                out.write_all(&result.output)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &ShowReport::new(&result))?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(result)
}

/// Re-analyze `file` whenever its contents change, until Ctrl-C.
pub async fn cmd_watch(file: &Path, config: ViewerConfig, interval: Duration) -> Result<()> {
    let mut doc = SourceDocument::open(file)?;
    let mut controller = AstViewController::new(config);
    let forwarder = controller.attach(Arc::new(TerminalViewer { separator: true }));

    let (file_name, source) = doc.analysis_input();
    controller.update(file_name, source)?;
    info!(
        file = %doc.display_name(),
        interval_ms = interval.as_millis() as u64,
        "watching file"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = refresh(&mut doc, &controller) {
                    warn!(file = %doc.display_name(), error = %e, "failed to check file");
                }
            }
            _ = &mut ctrl_c => {
                debug!("received ctrl-c");
                break;
            }
        }
    }

    controller.shutdown().await?;
    drop(controller);
    let _ = forwarder.await;
    Ok(())
}

/// Reloads the document and requests a new analysis if the file changed.
///
/// Returns true if an update was issued.
pub fn refresh(doc: &mut SourceDocument, controller: &AstViewController) -> Result<bool> {
    let path = doc
        .path()
        .ok_or("watched document has no path")?
        .to_path_buf();

    let on_disk = doc.load_bytes(&path)?;
    if on_disk == doc.disk_bytes() {
        return Ok(false);
    }

    doc.reload()?;
    let (file_name, source) = doc.analysis_input();
    let request_id = controller.update(file_name, source)?;
    debug!(file = %doc.display_name(), request_id = %request_id, "file changed");
    Ok(true)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use astview_models::ToolStatus;
    use astview_runner::RunnerConfig;
    use astview_viewer::ViewerEvent;
    use std::fs;
    use tempfile::tempdir;

    fn stub(script: &str) -> ViewerConfig {
        ViewerConfig::new(
            RunnerConfig::new("sh")
                .with_args(["-c", script, "stub"])
                .with_timeout(Some(Duration::from_secs(10))),
        )
    }

    #[tokio::test]
    async fn test_show_raw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, "package main\nfunc main(){}").unwrap();

        let mut out = Vec::new();
        let result = cmd_show(&path, stub("tr a-z A-Z"), OutputFormat::Raw, &mut out)
            .await
            .unwrap();

        assert_eq!(result.status, ToolStatus::Succeeded);
        assert_eq!(out, b"PACKAGE MAIN\nFUNC MAIN(){}");
        assert!(result.source_file_name.ends_with("main.go"));
    }

    #[tokio::test]
    async fn test_show_failure_writes_nothing_raw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, "package main").unwrap();

        let mut out = Vec::new();
        let result = cmd_show(
            &path,
            stub("cat >/dev/null; printf partial; printf 'parse error: line 1' >&2; exit 2"),
            OutputFormat::Raw,
            &mut out,
        )
        .await
        .unwrap();

        assert!(out.is_empty());
        assert_eq!(result.diagnostic().as_deref(), Some("parse error: line 1"));
    }

    #[tokio::test]
    async fn test_show_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, "package main").unwrap();

        let mut out = Vec::new();
        cmd_show(&path, stub("cat"), OutputFormat::Json, &mut out)
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["status"]["kind"], "succeeded");
        assert_eq!(json["output"], "package main");
    }

    #[tokio::test]
    async fn test_show_missing_file() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();

        let result = cmd_show(
            &dir.path().join("missing.go"),
            stub("cat"),
            OutputFormat::Raw,
            &mut out,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_only_on_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.go");
        fs::write(&path, "package main").unwrap();

        let mut doc = SourceDocument::open(&path).unwrap();
        let controller = AstViewController::new(stub("cat"));
        let mut events = controller.subscribe();

        assert!(!refresh(&mut doc, &controller).unwrap());

        fs::write(&path, "package changed").unwrap();
        assert!(refresh(&mut doc, &controller).unwrap());
        assert_eq!(doc.text(), "package changed");

        match events.recv().await.unwrap() {
            ViewerEvent::AnalysisOutput { output, .. } => assert_eq!(output, b"package changed"),
            other => panic!("expected output, got {:?}", other),
        }

        assert!(!refresh(&mut doc, &controller).unwrap());
    }

    #[tokio::test]
    async fn test_refresh_ignores_unchanged_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.go");
        fs::write(&path, b"package \xff main").unwrap();

        let mut doc = SourceDocument::open(&path).unwrap();
        let controller = AstViewController::new(stub("cat"));
        let mut runner_events = controller.runner_events();

        for _ in 0..5 {
            assert!(!refresh(&mut doc, &controller).unwrap());
        }

        tokio::task::yield_now().await;
        assert!(runner_events.try_recv().is_err());
    }
}
