//! Per-run mutable state of a single stage.

use super::status::{StageId, StageStatus};
use serde::{Deserialize, Serialize};

/// Progress value of a finished stage.
pub const PROGRESS_COMPLETE: u8 = 100;

/// The runtime state of one stage during one run.
///
/// Invariants upheld by the constructors:
/// - `progress == 0` whenever the stage is pending
/// - `progress == 100` iff the stage is completed
/// - `duration_seconds` is only set on completed stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRuntimeState {
    /// The stage this state belongs to.
    pub stage_id: StageId,

    /// Current status.
    pub status: StageStatus,

    /// Progress percentage in `0..=100`.
    pub progress: u8,

    /// Simulated duration, recorded on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl StageRuntimeState {
    /// Initial state of a stage.
    #[must_use]
    pub fn pending(stage_id: StageId) -> Self {
        Self {
            stage_id,
            status: StageStatus::Pending,
            progress: 0,
            duration_seconds: None,
        }
    }

    /// A stage in flight. Progress is clamped below completion.
    #[must_use]
    pub fn processing(stage_id: StageId, progress: u8) -> Self {
        Self {
            stage_id,
            status: StageStatus::Processing,
            progress: progress.min(PROGRESS_COMPLETE - 1),
            duration_seconds: None,
        }
    }

    /// A finished stage.
    #[must_use]
    pub fn completed(stage_id: StageId, duration_seconds: f64) -> Self {
        Self {
            stage_id,
            status: StageStatus::Completed,
            progress: PROGRESS_COMPLETE,
            duration_seconds: Some(duration_seconds),
        }
    }

    /// A faulted stage, keeping the progress it reached.
    #[must_use]
    pub fn failed(stage_id: StageId, progress: u8) -> Self {
        Self {
            stage_id,
            status: StageStatus::Error,
            progress: progress.min(PROGRESS_COMPLETE - 1),
            duration_seconds: None,
        }
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_has_zero_progress() {
        let state = StageRuntimeState::pending(StageId::new(1));
        assert_eq!(state.status, StageStatus::Pending);
        assert_eq!(state.progress, 0);
        assert!(state.duration_seconds.is_none());
    }

    #[test]
    fn test_processing_never_reports_complete() {
        let state = StageRuntimeState::processing(StageId::new(2), 100);
        assert_eq!(state.progress, 99);
        assert!(!state.is_completed());
    }

    #[test]
    fn test_completed_freezes_at_hundred() {
        let state = StageRuntimeState::completed(StageId::new(3), 2.0);
        assert_eq!(state.progress, PROGRESS_COMPLETE);
        assert_eq!(state.duration_seconds, Some(2.0));
        assert!(state.is_completed());
    }

    #[test]
    fn test_serialization_omits_missing_duration() {
        let json = serde_json::to_value(StageRuntimeState::pending(StageId::new(1))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stage_id": 1, "status": "pending", "progress": 0})
        );
    }
}
