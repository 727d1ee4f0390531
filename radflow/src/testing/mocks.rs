//! Test doubles for runner collaborators.

use crate::core::StageId;
use crate::registry::AiModel;
use crate::results::{ResultSynthesizer, RunResult, StageTiming};
use crate::stages::DurationSource;
use parking_lot::Mutex;
use std::time::Duration;

/// A fixed duration source that records every stage it was asked about.
#[derive(Debug)]
pub struct CountingDurationSource {
    duration: Duration,
    calls: Mutex<Vec<StageId>>,
}

impl CountingDurationSource {
    /// Creates a source returning `duration` for every stage.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Stage ids in the order their durations were drawn.
    #[must_use]
    pub fn calls(&self) -> Vec<StageId> {
        self.calls.lock().clone()
    }

    /// Number of executed stages.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl DurationSource for CountingDurationSource {
    fn next_duration(&self, stage_id: StageId) -> Duration {
        self.calls.lock().push(stage_id);
        self.duration
    }
}

/// A synthesizer that panics, for exercising the run task's fault path.
#[derive(Debug, Clone)]
pub struct PanickingSynthesizer {
    message: String,
}

impl PanickingSynthesizer {
    /// Creates a synthesizer panicking with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ResultSynthesizer for PanickingSynthesizer {
    fn synthesize(
        &self,
        _model: &AiModel,
        _processing_time: Duration,
        _stage_timings: &[StageTiming],
    ) -> RunResult {
        panic!("{}", self.message)
    }
}
