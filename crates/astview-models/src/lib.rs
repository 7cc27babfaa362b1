//! Core data models for astview.
//!
//! These types are shared between the tool runner, the view controller
//! and the command-line front end:
//! - `AnalysisRequest` - one snapshot of a source buffer to analyze
//! - `AnalysisResult` - the finalized outcome of running the tool once
//! - `RunnerState` - lifecycle of a single tool run

pub mod ids;
pub mod request;
pub mod result;
pub mod state;

pub use ids::{RequestId, ViewerId};
pub use request::AnalysisRequest;
pub use result::{AnalysisOutcome, AnalysisResult, ToolStatus};
pub use state::RunnerState;
