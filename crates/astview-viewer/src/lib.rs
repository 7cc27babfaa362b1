//! AST view controller.
//!
//! `AstViewController` is what an editor notifies whenever the watched
//! buffer changes. It turns each `update` into an `AnalysisRequest`, runs
//! the external tool through a `ToolRunner`, and republishes the outcome
//! to viewers.
//!
//! # Example
//!
//! ```ignore
//! use astview_runner::RunnerConfig;
//! use astview_viewer::{AstViewController, ViewerConfig, ViewerEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ViewerConfig::new(RunnerConfig::new("goastview"));
//!     let mut controller = AstViewController::new(config);
//!     let mut events = controller.subscribe();
//!
//!     controller.update("main.go", b"package main".to_vec())?;
//!
//!     match events.recv().await? {
//!         ViewerEvent::AnalysisOutput { output, .. } => {
//!             println!("{}", String::from_utf8_lossy(&output));
//!         }
//!         ViewerEvent::AnalysisError { message, .. } => eprintln!("{}", message),
//!     }
//!
//!     controller.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Supersession
//!
//! Only the newest request's outcome ever reaches viewers. When `update`
//! is called while an older run is still in flight, the older process is
//! killed and whatever it produced is discarded.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod viewer;

pub use config::ViewerConfig;
pub use controller::AstViewController;
pub use error::{Result, ViewerError};
pub use event::ViewerEvent;
pub use viewer::AstViewer;
