//! Core domain model types for radflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage identifiers and status
//! - Per-run stage state
//! - Pipeline events published to observers

mod event;
mod state;
mod status;

pub use event::PipelineEvent;
pub use state::{StageRuntimeState, PROGRESS_COMPLETE};
pub use status::{StageId, StageStatus};
