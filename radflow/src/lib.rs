//! # Radflow
//!
//! A simulated multi-stage radiology AI pipeline runner.
//!
//! Radflow animates a fixed sequence of analysis stages (mask generation,
//! classification, Grad-CAM, report generation) for a selected model, and
//! produces a synthesized result once every stage has completed:
//!
//! - **Stage registry**: the ordered stage definitions and their skip rules
//! - **Timer-driven executor**: per-stage progress from a pure `tick(now)`
//! - **Orchestrator**: strictly sequential stages, one run at a time
//! - **Event-driven observability**: every tick and transition published to a sink
//! - **Cancellation**: `reset` discards a run and drops its stray updates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use radflow::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = PipelineRunner::builder()
//!     .event_sink(std::sync::Arc::new(LoggingEventSink::debug()))
//!     .build()?;
//!
//! let model = ModelCatalog::default()
//!     .get("resnet-pneumonia")
//!     .cloned()
//!     .ok_or("unknown model")?;
//!
//! let request = RunRequest::new()
//!     .with_image(ImageHandle::new("chest.png"))
//!     .with_model(model)
//!     .with_patient(PatientInfo::new("PAT-1", "Demo Patient", 58));
//!
//! let result = runner.start_run(request)?.wait().await?;
//! println!("{} findings", result.findings.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::RunnerConfig;
    pub use crate::core::{PipelineEvent, StageId, StageRuntimeState, StageStatus};
    pub use crate::errors::{ConfigError, Requirement, RunError};
    pub use crate::events::{
        ChannelEventSink, CollectingEventSink, EventSink, FanoutEventSink, LoggingEventSink,
        NoOpEventSink,
    };
    pub use crate::pipeline::{
        Gender, ImageHandle, PatientInfo, PipelineRunner, PipelineRunnerBuilder, RunHandle,
        RunRequest,
    };
    pub use crate::registry::{AiModel, ModelCatalog, ModelKind, StageDefinition, StageRegistry};
    pub use crate::results::{
        CannedResultSynthesizer, Finding, ResultSynthesizer, RunResult, Severity, StageTiming,
    };
    pub use crate::stages::{
        DurationSource, FailStageAt, FaultInjector, FixedDurationSource, UniformDurationSource,
    };
    pub use crate::utils::{iso_timestamp, Timestamp};
}
