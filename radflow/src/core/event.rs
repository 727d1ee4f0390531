//! Pipeline events published to observers.

use super::state::StageRuntimeState;
use super::status::StageId;
use crate::results::RunResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event emitted by the pipeline runner.
///
/// Events for one run are published in the order they happen: every
/// `StageUpdated` for stage N precedes the first one for stage N+1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A run passed its precondition gate and began.
    RunStarted {
        /// The run.
        run_id: Uuid,
        /// Selected model id.
        model_id: String,
        /// When the event occurred (ISO 8601).
        timestamp: String,
    },

    /// A stage's runtime state changed.
    StageUpdated {
        /// The run.
        run_id: Uuid,
        /// The stage.
        stage_id: StageId,
        /// Snapshot of the new state.
        state: StageRuntimeState,
    },

    /// All stages completed and a result was synthesized.
    RunCompleted {
        /// The run.
        run_id: Uuid,
        /// The terminal artifact.
        result: RunResult,
    },

    /// The stage loop faulted.
    RunFailed {
        /// The run.
        run_id: Uuid,
        /// Stage that faulted, if known.
        stage_id: Option<StageId>,
        /// Failure description.
        error: String,
    },

    /// The run was discarded by a reset.
    RunReset {
        /// The run.
        run_id: Uuid,
        /// Why the run was discarded.
        reason: String,
    },
}

impl PipelineEvent {
    /// Creates a "run.started" event.
    #[must_use]
    pub fn started(run_id: Uuid, model_id: impl Into<String>) -> Self {
        Self::RunStarted {
            run_id,
            model_id: model_id.into(),
            timestamp: crate::utils::iso_timestamp(),
        }
    }

    /// Creates a "stage.updated" event.
    #[must_use]
    pub fn stage_updated(run_id: Uuid, state: StageRuntimeState) -> Self {
        Self::StageUpdated {
            run_id,
            stage_id: state.stage_id,
            state,
        }
    }

    /// Returns the dotted event type (e.g. "stage.updated").
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::StageUpdated { .. } => "stage.updated",
            Self::RunCompleted { .. } => "run.completed",
            Self::RunFailed { .. } => "run.failed",
            Self::RunReset { .. } => "run.reset",
        }
    }

    /// Returns the run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StageUpdated { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. }
            | Self::RunReset { run_id, .. } => *run_id,
        }
    }

    /// Returns the stage state carried by a `StageUpdated` event.
    #[must_use]
    pub fn stage_state(&self) -> Option<&StageRuntimeState> {
        match self {
            Self::StageUpdated { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Returns true for events that end a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RunCompleted { .. } | Self::RunFailed { .. } | Self::RunReset { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;

    #[test]
    fn test_event_type_names() {
        let run_id = Uuid::now_v7();
        assert_eq!(PipelineEvent::started(run_id, "unet-chest").event_type(), "run.started");

        let update = PipelineEvent::stage_updated(run_id, StageRuntimeState::pending(StageId::new(1)));
        assert_eq!(update.event_type(), "stage.updated");
        assert!(!update.is_terminal());
    }

    #[test]
    fn test_stage_updated_carries_state() {
        let run_id = Uuid::now_v7();
        let event = PipelineEvent::stage_updated(run_id, StageRuntimeState::processing(StageId::new(2), 40));

        let state = event.stage_state().unwrap();
        assert_eq!(state.status, StageStatus::Processing);
        assert_eq!(state.progress, 40);
        assert_eq!(event.run_id(), run_id);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = PipelineEvent::RunReset {
            run_id: Uuid::nil(),
            reason: "reset".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "run_reset");
        assert_eq!(json["reason"], "reset");
        assert!(event.is_terminal());
    }
}
