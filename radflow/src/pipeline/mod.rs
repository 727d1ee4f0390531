//! Pipeline runs.
//!
//! This module provides:
//! - Run requests and the precondition gate
//! - The per-run stage board and handle
//! - The sequential orchestrator
//! - The runner with its builder, reset and supersede semantics

mod board;
mod handle;
mod orchestrator;
mod request;
mod runner;

pub use board::StageBoard;
pub use handle::RunHandle;
pub use request::{Gender, ImageHandle, PatientInfo, RunRequest, ValidatedRequest};
pub use runner::{PipelineRunner, PipelineRunnerBuilder};
