//! Per-run state and the handle returned to the caller of `start_run`.

use super::board::StageBoard;
use crate::cancellation::CancellationToken;
use crate::core::{PipelineEvent, StageId, StageRuntimeState};
use crate::errors::RunError;
use crate::events::EventSink;
use crate::results::RunResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

/// State shared between a run's task, its handle and the runner.
pub(crate) struct RunShared {
    pub(crate) id: Uuid,
    pub(crate) model_id: String,
    pub(crate) board: StageBoard,
    pub(crate) token: CancellationToken,
    sink: Arc<dyn EventSink>,
    finished: AtomicBool,
}

impl RunShared {
    pub(crate) fn new(
        id: Uuid,
        model_id: impl Into<String>,
        states: Vec<StageRuntimeState>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id,
            model_id: model_id.into(),
            board: StageBoard::new(states),
            token: CancellationToken::new(),
            sink,
            finished: AtomicBool::new(false),
        }
    }

    /// Writes a stage state and publishes it, unless the run was cancelled.
    pub(crate) fn apply(&self, state: StageRuntimeState) -> bool {
        self.board.apply(state, &self.token, |state| {
            self.sink
                .try_emit(&PipelineEvent::stage_updated(self.id, state.clone()));
        })
    }

    /// Publishes a run-level event, unless the run was cancelled.
    pub(crate) fn publish(&self, event: &PipelineEvent) -> bool {
        self.board
            .publish_unless_cancelled(&self.token, || self.sink.try_emit(event))
    }

    /// Cancels the run, returns its board to `pending` and publishes `run.reset`.
    pub(crate) fn discard(&self, reason: &str) {
        self.token.cancel(reason);
        self.board.reset(|| {
            self.sink.try_emit(&PipelineEvent::RunReset {
                run_id: self.id,
                reason: reason.to_string(),
            });
        });
        warn!(run_id = %self.id, %reason, "Run discarded");
    }

    /// The error reported by a cancelled run.
    pub(crate) fn cancelled_error(&self) -> RunError {
        RunError::Cancelled {
            reason: self.token.reason().unwrap_or_else(|| "cancelled".to_string()),
        }
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Handle to one started run.
///
/// Each run owns its own stage states and cancellation token, so overlapping
/// runs cannot corrupt each other.
pub struct RunHandle {
    shared: Arc<RunShared>,
    task: JoinHandle<Result<RunResult, RunError>>,
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("id", &self.shared.id)
            .field("model_id", &self.shared.model_id)
            .field("cancelled", &self.shared.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl RunHandle {
    pub(crate) fn new(
        shared: Arc<RunShared>,
        task: JoinHandle<Result<RunResult, RunError>>,
    ) -> Self {
        Self { shared, task }
    }

    /// The run id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Id of the model this run uses.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.shared.model_id
    }

    /// Snapshot of every stage state.
    #[must_use]
    pub fn stages(&self) -> Vec<StageRuntimeState> {
        self.shared.board.snapshot()
    }

    /// Snapshot of one stage state.
    #[must_use]
    pub fn stage(&self, stage_id: StageId) -> Option<StageRuntimeState> {
        self.shared.board.get(stage_id)
    }

    /// Cancels this run. Already-applied stage states are left as they are.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.shared.token.cancel(reason);
    }

    /// Returns true if the run was cancelled or reset.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Returns true once the run task has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to end.
    pub async fn wait(self) -> Result<RunResult, RunError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(self.shared.cancelled_error()),
            Err(e) => Err(RunError::AnalysisFailed {
                stage_id: None,
                reason: format!("run task failed: {e}"),
            }),
        }
    }
}
