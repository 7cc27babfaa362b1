//! The controller an editor notifies on content change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use astview_models::{AnalysisRequest, AnalysisResult, RequestId, ViewerId};
use astview_runner::{RunHandle, RunnerEvent, ToolRunner};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::event::ViewerEvent;
use crate::viewer::AstViewer;

/// Keeps one AST viewer in sync with one source buffer.
///
/// `update` never blocks: requests are handed to a driver task that owns
/// the `ToolRunner`. Only the newest request's outcome is published.
pub struct AstViewController {
    /// Identifier used in logs.
    id: ViewerId,
    /// Configuration.
    config: ViewerConfig,
    /// Requests for the driver task.
    request_tx: mpsc::UnboundedSender<AnalysisRequest>,
    /// Viewer event broadcast channel.
    event_tx: broadcast::Sender<ViewerEvent>,
    /// Runner event broadcast channel.
    runner_tx: broadcast::Sender<RunnerEvent>,
    /// The last result delivered to viewers.
    last_result: Arc<RwLock<Option<AnalysisResult>>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Handle to the driver task.
    driver: Option<JoinHandle<()>>,
}

impl AstViewController {
    /// Creates a controller and starts its driver task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ViewerConfig) -> Self {
        let id = ViewerId::new();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (runner_tx, _) = broadcast::channel(config.runner.event_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let last_result = Arc::new(RwLock::new(None));

        let driver = Driver {
            id: id.clone(),
            runner: ToolRunner::with_events(config.runner.clone(), runner_tx.clone()),
            requests: request_rx,
            events: event_tx.clone(),
            last_result: Arc::clone(&last_result),
            shutdown: shutdown_rx,
            debounce: config.debounce,
        };
        let handle = tokio::spawn(driver.run());

        debug!(viewer = %id, tool = %config.runner.program, "view controller started");

        Self {
            id,
            config,
            request_tx,
            event_tx,
            runner_tx,
            last_result,
            shutdown_tx,
            driver: Some(handle),
        }
    }

    /// Returns the controller's identifier.
    pub fn id(&self) -> &ViewerId {
        &self.id
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Request a fresh AST for the buffer contents.
    ///
    /// Any older request still in flight is superseded: its process is
    /// killed and its output is never published.
    ///
    /// # Errors
    ///
    /// Returns `ViewerError::Stopped` after `shutdown`.
    pub fn update(
        &self,
        file_name: impl Into<String>,
        source_bytes: impl Into<Arc<[u8]>>,
    ) -> Result<RequestId> {
        let request = AnalysisRequest::new(file_name, source_bytes);
        let request_id = request.id.clone();
        trace!(
            viewer = %self.id,
            request_id = %request_id,
            file = %request.source_file_name,
            "update requested"
        );
        self.request_tx
            .send(request)
            .map_err(|_| ViewerError::Stopped)?;
        Ok(request_id)
    }

    /// Subscribe to viewer events.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to low-level runner events (process start, output chunks).
    pub fn runner_events(&self) -> broadcast::Receiver<RunnerEvent> {
        self.runner_tx.subscribe()
    }

    /// Forward every viewer event to `viewer` until the controller stops.
    pub fn attach(&self, viewer: Arc<dyn AstViewer>) -> JoinHandle<()> {
        let mut events = self.subscribe();
        let id = self.id.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => event.dispatch(viewer.as_ref()),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(viewer = %id, skipped, "viewer lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Returns the last result delivered to viewers.
    pub async fn last_result(&self) -> Option<AnalysisResult> {
        self.last_result.read().await.clone()
    }

    /// Check if the driver task is still running.
    pub fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the controller, killing any in-flight tool process.
    pub async fn shutdown(&mut self) -> Result<()> {
        let handle = self.driver.take().ok_or(ViewerError::Stopped)?;

        info!(viewer = %self.id, "shutting down view controller");
        let _ = self.shutdown_tx.send(true);

        handle
            .await
            .map_err(|e| ViewerError::Shutdown(format!("driver task panicked: {}", e)))?;

        debug!(viewer = %self.id, "view controller stopped");
        Ok(())
    }
}

impl Drop for AstViewController {
    fn drop(&mut self) {
        if self.driver.is_some() {
            let _ = self.shutdown_tx.send(true);
        }
    }
}

/// Serializes requests onto the runner and publishes results.
struct Driver {
    id: ViewerId,
    runner: ToolRunner,
    requests: mpsc::UnboundedReceiver<AnalysisRequest>,
    events: broadcast::Sender<ViewerEvent>,
    last_result: Arc<RwLock<Option<AnalysisResult>>>,
    shutdown: watch::Receiver<bool>,
    debounce: Duration,
}

impl Driver {
    async fn run(mut self) {
        let mut current: Option<RunHandle> = None;

        loop {
            // Pending requests win over a finished run so that a superseded
            // result is never published.
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!(viewer = %self.id, "driver received shutdown signal");
                        break;
                    }
                }
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    let Some(request) = self.coalesce(request).await else {
                        debug!(viewer = %self.id, "driver received shutdown signal while debouncing");
                        break;
                    };
                    current = Some(self.runner.run(request).await);
                }
                finished = wait_current(&mut current) => {
                    let request_id = current.take().map(|h| h.request_id().clone());
                    match finished {
                        Ok(result) => self.publish(result).await,
                        Err(e) => {
                            debug!(viewer = %self.id, request_id = ?request_id, error = %e, "run dropped");
                        }
                    }
                }
            }
        }

        if self.runner.cancel().await {
            debug!(viewer = %self.id, "killed in-flight run on shutdown");
        }
    }

    /// Collapses queued and debounced requests into the newest one.
    ///
    /// Returns `None` if shutdown was signalled during the debounce window.
    async fn coalesce(&mut self, mut request: AnalysisRequest) -> Option<AnalysisRequest> {
        loop {
            while let Ok(newer) = self.requests.try_recv() {
                trace!(viewer = %self.id, request_id = %request.id, "request superseded before start");
                request = newer;
            }
            if self.debounce.is_zero() {
                return Some(request);
            }
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return None;
                    }
                }
                newer = tokio::time::timeout(self.debounce, self.requests.recv()) => match newer {
                    Ok(Some(newer)) => {
                        trace!(viewer = %self.id, request_id = %request.id, "request debounced");
                        request = newer;
                    }
                    Ok(None) | Err(_) => return Some(request),
                },
            }
        }
    }

    async fn publish(&self, result: AnalysisResult) {
        let event = ViewerEvent::from_result(&result);
        info!(
            viewer = %self.id,
            request_id = %result.request_id,
            error = event.is_error(),
            "publishing analysis"
        );
        *self.last_result.write().await = Some(result);
        let _ = self.events.send(event);
    }
}

async fn wait_current(current: &mut Option<RunHandle>) -> astview_runner::Result<AnalysisResult> {
    match current {
        Some(handle) => handle.finished().await,
        None => std::future::pending().await,
    }
}
