//! Timer-driven execution of a single stage.

use super::faults::{FaultInjector, NoFaults};
use super::ticker::StageTicker;
use crate::cancellation::CancellationToken;
use crate::core::{StageId, StageRuntimeState};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// How a stage execution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Progress reached 100.
    Completed(StageRuntimeState),
    /// A fault was injected; the state carries the `error` status.
    Failed {
        /// The final (error) state.
        state: StageRuntimeState,
        /// Why the stage failed.
        reason: String,
    },
    /// The run was cancelled; no further update was applied.
    Cancelled,
}

impl StageOutcome {
    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Animates one stage from 0 to 100 on a fixed tick.
#[derive(Clone)]
pub struct StageExecutor {
    tick_interval: Duration,
    faults: Arc<dyn FaultInjector>,
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor")
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl StageExecutor {
    /// Creates an executor ticking every `tick_interval` (at least 1 ms).
    #[must_use]
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            faults: Arc::new(NoFaults),
        }
    }

    /// Installs a fault injector.
    #[must_use]
    pub fn with_faults(mut self, faults: Arc<dyn FaultInjector>) -> Self {
        self.faults = faults;
        self
    }

    /// The tick period.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Runs one stage to completion.
    ///
    /// `apply` receives every new state, starting with `processing`/0. It
    /// returns `false` if the update was rejected (the run was reset), which
    /// ends the execution as cancelled. The token is checked before every
    /// update, and cancelling it wakes the executor immediately.
    ///
    /// The returned future resolves exactly once per call.
    pub async fn execute<F>(
        &self,
        stage_id: StageId,
        duration: Duration,
        token: &CancellationToken,
        mut apply: F,
    ) -> StageOutcome
    where
        F: FnMut(StageRuntimeState) -> bool + Send,
    {
        if token.is_cancelled() || !apply(StageRuntimeState::processing(stage_id, 0)) {
            return StageOutcome::Cancelled;
        }

        let started_at = Instant::now();
        let ticker = StageTicker::new(stage_id, started_at, duration);
        debug!(stage_id = %stage_id, duration_ms = duration.as_millis(), "Stage started");

        let mut ticks = interval_at(started_at + self.tick_interval, self.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let cancelled = token.cancelled();
        tokio::pin!(cancelled);

        loop {
            tokio::select! {
                biased;
                () = &mut cancelled => {
                    debug!(stage_id = %stage_id, "Stage cancelled");
                    return StageOutcome::Cancelled;
                }
                _ = ticks.tick() => {
                    let state = ticker.tick(Instant::now());

                    if let Some(reason) = self.faults.check(stage_id, state.progress) {
                        warn!(stage_id = %stage_id, progress = state.progress, %reason, "Stage fault injected");
                        return StageOutcome::Failed {
                            state: StageRuntimeState::failed(stage_id, state.progress),
                            reason,
                        };
                    }

                    if token.is_cancelled() || !apply(state.clone()) {
                        return StageOutcome::Cancelled;
                    }

                    if state.is_completed() {
                        debug!(stage_id = %stage_id, "Stage completed");
                        return StageOutcome::Completed(state);
                    }
                }
            }
        }
    }
}
