//! Opt-in per-stage failure injection.
//!
//! The simulated pipeline never fails on its own. A [`FaultInjector`] lets a
//! caller fail a chosen stage, driving it to the `error` status and the run to
//! `AnalysisFailed`.

use crate::core::StageId;

/// Decides whether a stage faults at a given progress.
pub trait FaultInjector: Send + Sync {
    /// Returns a failure reason to fail `stage_id` at `progress`.
    fn check(&self, stage_id: StageId, progress: u8) -> Option<String>;
}

/// Never injects a fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn check(&self, _stage_id: StageId, _progress: u8) -> Option<String> {
        None
    }
}

/// Fails one stage once it reaches a progress threshold.
#[derive(Debug, Clone)]
pub struct FailStageAt {
    stage_id: StageId,
    progress: u8,
    reason: String,
}

impl FailStageAt {
    /// Fails `stage_id` once its progress reaches `progress`.
    #[must_use]
    pub fn new(stage_id: StageId, progress: u8, reason: impl Into<String>) -> Self {
        Self {
            stage_id,
            progress,
            reason: reason.into(),
        }
    }
}

impl FaultInjector for FailStageAt {
    fn check(&self, stage_id: StageId, progress: u8) -> Option<String> {
        (stage_id == self.stage_id && progress >= self.progress).then(|| self.reason.clone())
    }
}
