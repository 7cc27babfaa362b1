//! Async subprocess runner for the external AST tool.
//!
//! A `ToolRunner` owns at most one child process at a time. Each call to
//! `run` launches the configured tool with the request's file name as its
//! last argument, writes the source bytes to the tool's stdin, and
//! collects stdout/stderr incrementally until the process exits.
//!
//! # Example
//!
//! ```ignore
//! use astview_models::AnalysisRequest;
//! use astview_runner::{RunnerConfig, ToolRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runner = ToolRunner::new(RunnerConfig::new("goastview"));
//!
//!     let request = AnalysisRequest::new("main.go", b"package main".to_vec());
//!     let mut handle = runner.run(request).await;
//!
//!     let result = handle.finished().await?;
//!     println!("{}", String::from_utf8_lossy(&result.output));
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle
//!
//! Every run goes `Starting -> Running -> {Succeeded, Failed, SpawnError}`
//! and ends with exactly one `RunnerEvent::Finished`. Starting a new run
//! while the previous one is still alive kills and reaps the old process
//! first; the old handle then resolves to `RunnerError::Superseded`.

pub mod config;
pub mod error;
pub mod event;
pub mod runner;
pub mod tool;

pub use config::RunnerConfig;
pub use error::{Result, RunnerError};
pub use event::RunnerEvent;
pub use runner::{RunHandle, ToolRunner};
pub use tool::ToolCommand;
