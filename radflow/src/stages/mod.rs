//! Stage execution: the pure ticker, duration sources, fault injection and
//! the timer-driven executor.
//!
//! A stage moves `pending -> processing -> completed`. The `error` status is
//! reachable only through a [`FaultInjector`] or the orchestrator's stage
//! timeout.

mod duration;
mod executor;
mod faults;
mod ticker;

pub use duration::{DurationSource, FixedDurationSource, UniformDurationSource};
pub use executor::{StageExecutor, StageOutcome};
pub use faults::{FailStageAt, FaultInjector, NoFaults};
pub use ticker::{progress_at, StageTicker};
