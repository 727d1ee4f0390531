//! The sequential stage loop of one run.

use super::handle::RunShared;
use crate::core::{PipelineEvent, StageRuntimeState};
use crate::errors::RunError;
use crate::registry::{AiModel, StageRegistry};
use crate::results::{ResultSynthesizer, RunResult, StageTiming};
use crate::stages::{DurationSource, StageExecutor, StageOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Runs every stage of a run in id order and synthesizes the result.
#[derive(Clone)]
pub(crate) struct Orchestrator {
    pub(crate) registry: Arc<StageRegistry>,
    pub(crate) executor: StageExecutor,
    pub(crate) durations: Arc<dyn DurationSource>,
    pub(crate) synthesizer: Arc<dyn ResultSynthesizer>,
    pub(crate) skipped_stage_secs: f64,
    pub(crate) stage_timeout: Duration,
    pub(crate) max_stage_duration: Duration,
}

impl Orchestrator {
    /// How long a stage drawn to last `duration` may run before it is failed.
    ///
    /// Durations within the configured range get `stage_timeout`; longer ones
    /// keep the same grace beyond their own length.
    pub(crate) fn stage_deadline(&self, duration: Duration) -> Duration {
        let grace = self.stage_timeout.saturating_sub(self.max_stage_duration);
        self.stage_timeout.max(duration.saturating_add(grace))
    }

    /// Drives `run` to its end.
    ///
    /// A stage that is not required for `model` is completed immediately with
    /// the nominal skip duration. Every other stage is executed and awaited
    /// before the next one starts.
    pub(crate) async fn run(&self, run: &RunShared, model: &AiModel) -> Result<RunResult, RunError> {
        let started = Instant::now();
        let mut timings = Vec::with_capacity(self.registry.len());

        for stage in self.registry.stages() {
            let stage_id = stage.id;
            if run.token.is_cancelled() {
                return Err(run.cancelled_error());
            }

            if !self.registry.is_required(stage_id, model) {
                debug!(stage_id = %stage_id, stage = %stage.name, "Stage skipped");
                if !run.apply(StageRuntimeState::completed(stage_id, self.skipped_stage_secs)) {
                    return Err(run.cancelled_error());
                }
                timings.push(StageTiming {
                    stage_id,
                    duration_seconds: self.skipped_stage_secs,
                });
                continue;
            }

            let duration = self.durations.next_duration(stage_id);
            info!(stage_id = %stage_id, stage = %stage.name, duration_ms = %duration.as_millis(), "Stage started");

            let deadline = self.stage_deadline(duration);
            let mut last_progress = 0;
            let execution = self.executor.execute(stage_id, duration, &run.token, |state| {
                last_progress = state.progress;
                run.apply(state)
            });

            let outcome = tokio::time::timeout(deadline, execution).await;
            match outcome {
                Ok(StageOutcome::Completed(state)) => {
                    let duration_seconds = state
                        .duration_seconds
                        .unwrap_or_else(|| duration.as_secs_f64());
                    info!(stage_id = %stage_id, duration_seconds, "Stage completed");
                    timings.push(StageTiming {
                        stage_id,
                        duration_seconds,
                    });
                }
                Ok(StageOutcome::Failed { state, reason }) => {
                    if !run.apply(state) {
                        return Err(run.cancelled_error());
                    }
                    return Err(RunError::stage_failed(stage_id, reason));
                }
                Ok(StageOutcome::Cancelled) => return Err(run.cancelled_error()),
                Err(_) => {
                    warn!(stage_id = %stage_id, timeout_ms = %deadline.as_millis(), "Stage timed out");
                    if !run.apply(StageRuntimeState::failed(stage_id, last_progress)) {
                        return Err(run.cancelled_error());
                    }
                    return Err(RunError::stage_failed(
                        stage_id,
                        format!("stage timed out after {}ms", deadline.as_millis()),
                    ));
                }
            }
        }

        if run.token.is_cancelled() {
            return Err(run.cancelled_error());
        }

        let result = self.synthesizer.synthesize(model, started.elapsed(), &timings);
        let event = PipelineEvent::RunCompleted {
            run_id: run.id,
            result: result.clone(),
        };
        if !run.publish(&event) {
            return Err(run.cancelled_error());
        }

        info!(
            result_id = %result.id,
            findings = result.findings.len(),
            processing_time = result.processing_time,
            "Run completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::CannedResultSynthesizer;
    use crate::stages::FixedDurationSource;

    fn orchestrator(timeout_ms: u64, max_ms: u64) -> Orchestrator {
        Orchestrator {
            registry: Arc::new(StageRegistry::default()),
            executor: StageExecutor::new(Duration::from_millis(16)),
            durations: Arc::new(FixedDurationSource::from_millis(2000)),
            synthesizer: Arc::new(CannedResultSynthesizer::default()),
            skipped_stage_secs: 0.1,
            stage_timeout: Duration::from_millis(timeout_ms),
            max_stage_duration: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn test_stage_deadline_covers_long_durations() {
        let orchestrator = orchestrator(10_000, 2500);
        let ms = |ms| Duration::from_millis(ms);

        assert_eq!(orchestrator.stage_deadline(ms(2000)), ms(10_000));
        assert_eq!(orchestrator.stage_deadline(ms(2500)), ms(10_000));
        assert_eq!(orchestrator.stage_deadline(ms(12_000)), ms(19_500));
        assert_eq!(orchestrator.stage_deadline(Duration::MAX), Duration::MAX);
    }
}
