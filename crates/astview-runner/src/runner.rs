//! Tool runner owning at most one child process.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use astview_models::{AnalysisRequest, AnalysisResult, RequestId, RunnerState, ToolStatus};

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::event::RunnerEvent;
use crate::tool::ToolCommand;

/// Handle to one run, resolving to its single terminal result.
#[derive(Debug)]
pub struct RunHandle {
    request_id: RequestId,
    state: watch::Receiver<RunnerState>,
    result: Option<oneshot::Receiver<AnalysisResult>>,
}

impl RunHandle {
    /// Returns the request this run serves.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the current lifecycle state of the run.
    pub fn state(&self) -> RunnerState {
        *self.state.borrow()
    }

    /// Waits for the run's result.
    ///
    /// Cancel safe: dropping the future before it completes leaves the
    /// result available for a later call.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Superseded` if the run was killed in favour of
    /// a newer one, and `RunnerError::ResultTaken` if the result was
    /// already returned by an earlier call.
    pub async fn finished(&mut self) -> Result<AnalysisResult> {
        let rx = self
            .result
            .as_mut()
            .ok_or_else(|| RunnerError::ResultTaken(self.request_id.clone()))?;
        let outcome = rx.await;
        self.result = None;
        outcome.map_err(|_| RunnerError::Superseded(self.request_id.clone()))
    }

    /// Consumes the handle and waits for the run's result.
    pub async fn wait(mut self) -> Result<AnalysisResult> {
        self.finished().await
    }
}

/// The run currently owned by a runner.
struct ActiveRun {
    request_id: RequestId,
    state: watch::Receiver<RunnerState>,
    cancel_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Launches the analysis tool, one process at a time.
pub struct ToolRunner {
    /// Configuration shared with run tasks.
    config: Arc<RunnerConfig>,
    /// Event broadcast channel.
    event_tx: broadcast::Sender<RunnerEvent>,
    /// The latest run, finished or not.
    active: Option<ActiveRun>,
}

impl ToolRunner {
    /// Creates a new runner.
    pub fn new(config: RunnerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            config: Arc::new(config),
            event_tx,
            active: None,
        }
    }

    /// Creates a runner that publishes on an existing event channel.
    pub fn with_events(config: RunnerConfig, event_tx: broadcast::Sender<RunnerEvent>) -> Self {
        Self {
            config: Arc::new(config),
            event_tx,
            active: None,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Subscribe to runner events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunnerEvent> {
        self.event_tx.subscribe()
    }

    /// Returns the lifecycle state of the latest run.
    pub fn state(&self) -> RunnerState {
        self.active
            .as_ref()
            .map(|run| *run.state.borrow())
            .unwrap_or_default()
    }

    /// Returns true while the latest run's process may still be alive.
    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.task.is_finished())
    }

    /// Returns the request served by the latest run.
    pub fn active_request(&self) -> Option<&RequestId> {
        self.active.as_ref().map(|run| &run.request_id)
    }

    /// Start a run for the request.
    ///
    /// Any run still in flight is killed and reaped before the new process
    /// is launched, so at most one child is ever alive per runner.
    pub async fn run(&mut self, request: AnalysisRequest) -> RunHandle {
        self.cancel().await;

        let request_id = request.id.clone();
        let (state_tx, state_rx) = watch::channel(RunnerState::Starting);
        let (result_tx, result_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        debug!(
            request_id = %request_id,
            file = %request.source_file_name,
            bytes = request.len(),
            "starting run"
        );

        let job = Job {
            request,
            config: Arc::clone(&self.config),
            events: self.event_tx.clone(),
            state_tx,
            result_tx,
            cancel_rx,
        };
        let task = tokio::spawn(job.drive());

        self.active = Some(ActiveRun {
            request_id: request_id.clone(),
            state: state_rx.clone(),
            cancel_tx,
            task,
        });

        RunHandle {
            request_id,
            state: state_rx,
            result: Some(result_rx),
        }
    }

    /// Kill the in-flight run, if any, and wait until its process is reaped.
    ///
    /// Returns true if a live run was cancelled.
    pub async fn cancel(&mut self) -> bool {
        let live = self
            .active
            .as_ref()
            .is_some_and(|run| !run.state.borrow().is_terminal() && !run.task.is_finished());
        if !live {
            return false;
        }
        let Some(active) = self.active.take() else {
            return false;
        };

        debug!(request_id = %active.request_id, "cancelling run");
        let _ = active.cancel_tx.send(());
        if let Err(e) = active.task.await {
            warn!(request_id = %active.request_id, error = %e, "run task failed");
        }
        true
    }
}

/// How the exchange with the child ended.
enum Ended {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Everything a spawned run task needs.
struct Job {
    request: AnalysisRequest,
    config: Arc<RunnerConfig>,
    events: broadcast::Sender<RunnerEvent>,
    state_tx: watch::Sender<RunnerState>,
    result_tx: oneshot::Sender<AnalysisResult>,
    cancel_rx: oneshot::Receiver<()>,
}

impl Job {
    async fn drive(self) {
        let Job {
            request,
            config,
            events,
            state_tx,
            result_tx,
            mut cancel_rx,
        } = self;
        let started_at = Utc::now();
        let mut output = Vec::new();
        let mut error = Vec::new();

        let spawned = match ToolCommand::resolve(&config) {
            Err(e) => Err(e.to_string()),
            Ok(tool) => {
                trace!(
                    request_id = %request.id,
                    command = %tool.display(&request.source_file_name),
                    "spawning tool"
                );
                tool.command(&config, &request.source_file_name)
                    .spawn()
                    .map_err(|e| format!("failed to start {}: {}", tool.program.display(), e))
            }
        };

        let status = match spawned {
            Err(message) => {
                if !matches!(cancel_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
                    state_tx.send_replace(RunnerState::Failed);
                    debug!(request_id = %request.id, "run superseded before start");
                    let _ = events.send(RunnerEvent::Superseded {
                        request_id: request.id.clone(),
                    });
                    return;
                }
                warn!(request_id = %request.id, error = %message, "tool failed to start");
                ToolStatus::SpawnError { message }
            }
            Ok(mut child) => {
                let pid = child.id();
                state_tx.send_replace(RunnerState::Running);
                debug!(request_id = %request.id, pid = ?pid, "tool started");
                let _ = events.send(RunnerEvent::Started {
                    request_id: request.id.clone(),
                    pid,
                });

                let ended = {
                    let exchange = exchange(
                        &mut child,
                        &request,
                        config.read_chunk_size,
                        &events,
                        &mut output,
                        &mut error,
                    );
                    let deadline = async {
                        match config.timeout {
                            Some(timeout) => tokio::time::sleep(timeout).await,
                            None => std::future::pending::<()>().await,
                        }
                    };

                    tokio::select! {
                        exited = exchange => Ended::Exited(exited),
                        _ = deadline => Ended::TimedOut,
                        _ = &mut cancel_rx => Ended::Cancelled,
                    }
                };

                match ended {
                    Ended::Exited(Ok(exit)) => {
                        let stderr_failed = config.stderr_is_failure && !error.is_empty();
                        if exit.success() && !stderr_failed {
                            ToolStatus::Succeeded
                        } else {
                            ToolStatus::Failed { code: exit.code() }
                        }
                    }
                    Ended::Exited(Err(e)) => {
                        warn!(request_id = %request.id, error = %e, "tool pipe failed");
                        reap(&mut child, &request.id).await;
                        if error.is_empty() {
                            error.extend_from_slice(e.to_string().as_bytes());
                        }
                        ToolStatus::Failed { code: None }
                    }
                    Ended::TimedOut => {
                        let after = config.timeout.unwrap_or_default();
                        warn!(
                            request_id = %request.id,
                            timeout_ms = after.as_millis() as u64,
                            "tool timed out"
                        );
                        reap(&mut child, &request.id).await;
                        ToolStatus::TimedOut { after }
                    }
                    Ended::Cancelled => {
                        reap(&mut child, &request.id).await;
                        state_tx.send_replace(RunnerState::Failed);
                        debug!(request_id = %request.id, "run superseded");
                        let _ = events.send(RunnerEvent::Superseded {
                            request_id: request.id.clone(),
                        });
                        return;
                    }
                }
            }
        };

        let result = AnalysisResult {
            request_id: request.id.clone(),
            source_file_name: request.source_file_name.clone(),
            output,
            error,
            status: status.clone(),
            started_at,
            finished_at: Utc::now(),
        };

        state_tx.send_replace(status.state());
        info!(
            request_id = %request.id,
            status = ?status,
            output_len = result.output.len(),
            error_len = result.error.len(),
            elapsed_ms = result.elapsed().as_millis() as u64,
            "run finished"
        );
        let _ = events.send(RunnerEvent::Finished {
            request_id: request.id.clone(),
            status,
        });

        if result_tx.send(result).is_err() {
            trace!(request_id = %request.id, "run handle dropped before result");
        }
    }
}

/// Feeds stdin and drains both output pipes, then waits for exit.
async fn exchange(
    child: &mut Child,
    request: &AnalysisRequest,
    chunk_size: usize,
    events: &broadcast::Sender<RunnerEvent>,
    output: &mut Vec<u8>,
    error: &mut Vec<u8>,
) -> io::Result<ExitStatus> {
    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("tool stdout unavailable"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("tool stderr unavailable"))?;

    let request_id = &request.id;
    let (fed, out, err) = tokio::join!(
        feed(stdin, &request.source_bytes),
        drain(stdout, chunk_size, output, events, |chunk| {
            RunnerEvent::Stdout {
                request_id: request_id.clone(),
                chunk,
            }
        }),
        drain(stderr, chunk_size, error, events, |chunk| {
            RunnerEvent::Stderr {
                request_id: request_id.clone(),
                chunk,
            }
        }),
    );
    fed?;
    out?;
    err?;

    child.wait().await
}

/// Writes the source to stdin and closes it.
async fn feed(stdin: Option<ChildStdin>, bytes: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    let written = async {
        stdin.write_all(bytes).await?;
        stdin.flush().await
    }
    .await;

    // stdin is dropped on return, which closes the pipe.
    match written {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            trace!("tool closed stdin before reading all input");
            Ok(())
        }
        other => other,
    }
}

/// Appends everything read from `pipe` to `buffer`, publishing each chunk.
async fn drain<R, F>(
    mut pipe: R,
    chunk_size: usize,
    buffer: &mut Vec<u8>,
    events: &broadcast::Sender<RunnerEvent>,
    to_event: F,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: Fn(Vec<u8>) -> RunnerEvent,
{
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);
        let _ = events.send(to_event(chunk[..n].to_vec()));
    }
}

/// Kills the child and waits for it so no zombie is left behind.
async fn reap(child: &mut Child, request_id: &RequestId) {
    if let Err(e) = child.kill().await {
        debug!(request_id = %request_id, error = %e, "failed to kill tool");
    }
}
