//! Integration tests for the view controller against `sh` stub tools.

#![cfg(unix)]

use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use astview_runner::{RunnerConfig, RunnerEvent};
use astview_viewer::{AstViewController, AstViewer, ViewerConfig, ViewerEvent};
use tokio::sync::broadcast;

const MAIN_GO: &str = "package main\nfunc main(){}";

fn stub(script: &str) -> ViewerConfig {
    ViewerConfig::new(
        RunnerConfig::new("sh")
            .with_args(["-c", script, "stub"])
            .with_timeout(Some(Duration::from_secs(10))),
    )
}

fn process_alive(pid: u32) -> bool {
    Command::new("sh")
        .args(["-c", &format!("kill -0 {} 2>/dev/null", pid)])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

async fn next_event(events: &mut broadcast::Receiver<ViewerEvent>) -> ViewerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for viewer event")
        .expect("viewer channel closed")
}

async fn assert_quiet(events: &mut broadcast::Receiver<ViewerEvent>) {
    let extra = tokio::time::timeout(Duration::from_millis(300), events.recv()).await;
    assert!(extra.is_err(), "unexpected extra event: {:?}", extra);
}

/// Records viewer callbacks in order.
#[derive(Default)]
struct RecordingViewer {
    outputs: Mutex<Vec<Vec<u8>>>,
    errors: Mutex<Vec<String>>,
}

impl AstViewer for RecordingViewer {
    fn on_analysis_output(&self, output: &[u8]) {
        self.outputs.lock().unwrap().push(output.to_vec());
    }

    fn on_analysis_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test]
async fn test_fixed_payload_delivered_once() {
    let controller = AstViewController::new(stub("cat >/dev/null; printf 'FILE GoSource main 1'"));
    let mut events = controller.subscribe();

    let request_id = controller.update("main.go", MAIN_GO.as_bytes().to_vec()).unwrap();

    match next_event(&mut events).await {
        ViewerEvent::AnalysisOutput {
            request_id: id,
            file_name,
            output,
        } => {
            assert_eq!(id, request_id);
            assert_eq!(file_name, "main.go");
            assert_eq!(output.len(), 20);
            assert_eq!(output, b"FILE GoSource main 1");
        }
        other => panic!("expected output, got {:?}", other),
    }
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_parse_error_reaches_viewer() {
    let controller = AstViewController::new(stub(
        "cat >/dev/null; printf 'parse error: line 1' >&2; exit 2",
    ));
    let viewer = Arc::new(RecordingViewer::default());
    let forwarder = controller.attach(viewer.clone());
    let mut events = controller.subscribe();

    controller.update("main.go", MAIN_GO.as_bytes().to_vec()).unwrap();
    next_event(&mut events).await;
    tokio::task::yield_now().await;
    drop(controller);
    tokio::time::timeout(Duration::from_secs(2), forwarder)
        .await
        .expect("forwarder should stop with the controller")
        .unwrap();

    assert!(viewer.outputs.lock().unwrap().is_empty());
    assert_eq!(
        *viewer.errors.lock().unwrap(),
        vec!["parse error: line 1".to_string()]
    );
}

#[tokio::test]
async fn test_missing_executable_reports_spawn_error() {
    let controller = AstViewController::new(ViewerConfig::new(RunnerConfig::new(
        "/nonexistent/astview-tool",
    )));
    let mut events = controller.subscribe();
    let mut runner_events = controller.runner_events();

    controller.update("main.go", MAIN_GO.as_bytes().to_vec()).unwrap();

    match next_event(&mut events).await {
        ViewerEvent::AnalysisError { message, .. } => {
            assert!(message.contains("/nonexistent/astview-tool"), "{}", message);
        }
        other => panic!("expected error, got {:?}", other),
    }

    // A process never existed.
    while let Ok(event) = runner_events.try_recv() {
        assert!(!matches!(event, RunnerEvent::Started { .. }));
    }
}

#[tokio::test]
async fn test_rapid_updates_deliver_only_the_second() {
    let controller = AstViewController::new(stub(
        "input=$(cat); case \"$input\" in slow*) exec sleep 5;; esac; printf '%s' \"$input\"",
    ));
    let mut events = controller.subscribe();
    let mut runner_events = controller.runner_events();

    controller.update("main.go", b"slow".to_vec()).unwrap();
    let first_pid = loop {
        match runner_events.recv().await.unwrap() {
            RunnerEvent::Started { pid, .. } => break pid.unwrap(),
            _ => continue,
        }
    };

    let second = controller.update("main.go", b"fast".to_vec()).unwrap();

    match next_event(&mut events).await {
        ViewerEvent::AnalysisOutput { request_id, output, .. } => {
            assert_eq!(request_id, second);
            assert_eq!(output, b"fast");
        }
        other => panic!("expected output, got {:?}", other),
    }
    assert!(!process_alive(first_pid));
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_back_to_back_updates_before_start() {
    let controller = AstViewController::new(stub("cat"));
    let mut events = controller.subscribe();

    controller.update("main.go", b"first".to_vec()).unwrap();
    let second = controller.update("main.go", b"second".to_vec()).unwrap();

    let event = next_event(&mut events).await;
    assert_eq!(event.request_id(), &second);
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_identical_updates_are_independent() {
    let controller = AstViewController::new(stub("tr a-z A-Z"));
    let mut events = controller.subscribe();

    let first = controller.update("main.go", MAIN_GO.as_bytes().to_vec()).unwrap();
    let first_event = next_event(&mut events).await;
    let second = controller.update("main.go", MAIN_GO.as_bytes().to_vec()).unwrap();
    let second_event = next_event(&mut events).await;

    assert_ne!(first, second);
    assert_eq!(first_event.request_id(), &first);
    assert_eq!(second_event.request_id(), &second);

    match (first_event, second_event) {
        (
            ViewerEvent::AnalysisOutput { output: a, .. },
            ViewerEvent::AnalysisOutput { output: b, .. },
        ) => {
            assert_eq!(a, b);
            assert_eq!(a, MAIN_GO.to_uppercase().into_bytes());
        }
        other => panic!("expected two outputs, got {:?}", other),
    }
}

#[tokio::test]
async fn test_source_reaches_tool_unchanged() {
    let controller = AstViewController::new(stub("cat"));
    let mut events = controller.subscribe();
    let source = "package main\n\n// ünïcödé 日本語 🦀\nvar s = \"\u{00e9}\"\n";

    controller.update("main.go", source.as_bytes().to_vec()).unwrap();

    match next_event(&mut events).await {
        ViewerEvent::AnalysisOutput { output, .. } => assert_eq!(output, source.as_bytes()),
        other => panic!("expected output, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_kills_in_flight_process() {
    let mut controller = AstViewController::new(stub("exec sleep 5"));
    let mut runner_events = controller.runner_events();

    controller.update("main.go", b"package main".to_vec()).unwrap();
    let pid = loop {
        match runner_events.recv().await.unwrap() {
            RunnerEvent::Started { pid, .. } => break pid.unwrap(),
            _ => continue,
        }
    };

    tokio::time::timeout(Duration::from_secs(2), controller.shutdown())
        .await
        .expect("shutdown should not wait for the tool")
        .unwrap();

    assert!(!process_alive(pid));
    assert!(controller.last_result().await.is_none());
}
