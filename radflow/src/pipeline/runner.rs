//! The pipeline runner: precondition gate, run lifecycle and reset.

use super::handle::{RunHandle, RunShared};
use super::orchestrator::Orchestrator;
use super::request::RunRequest;
use crate::config::RunnerConfig;
use crate::core::{PipelineEvent, StageRuntimeState};
use crate::errors::{ConfigError, RunError};
use crate::events::{EventSink, NoOpEventSink};
use crate::registry::StageRegistry;
use crate::results::{CannedResultSynthesizer, ResultSynthesizer};
use crate::stages::{DurationSource, FaultInjector, NoFaults, StageExecutor, UniformDurationSource};
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Runs simulated analyses, one current run at a time.
///
/// `start_run` validates its request and spawns the run on the tokio runtime;
/// starting a new run supersedes an unfinished one, and [`PipelineRunner::reset`]
/// discards the current run at any time.
pub struct PipelineRunner {
    config: RunnerConfig,
    registry: Arc<StageRegistry>,
    orchestrator: Orchestrator,
    sink: Arc<dyn EventSink>,
    current: Mutex<Option<Arc<RunShared>>>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("config", &self.config)
            .field("stages", &self.registry.len())
            .field("current_run", &self.current_run_id())
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a runner builder.
    #[must_use]
    pub fn builder() -> PipelineRunnerBuilder {
        PipelineRunnerBuilder::new()
    }

    /// The runner configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The stage registry.
    #[must_use]
    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Id of the current run, if any.
    #[must_use]
    pub fn current_run_id(&self) -> Option<Uuid> {
        self.current.lock().as_ref().map(|run| run.id)
    }

    /// Snapshot of the current run's stages, or the initial states if there
    /// is no current run.
    #[must_use]
    pub fn stages(&self) -> Vec<StageRuntimeState> {
        self.current.lock().as_ref().map_or_else(
            || self.registry.initial_states(),
            |run| run.board.snapshot(),
        )
    }

    /// Starts a run.
    ///
    /// Fails with [`RunError::MissingRequirements`] without touching any state
    /// if the image, model or patient info is missing. Otherwise an unfinished
    /// previous run is discarded, the new run begins from an all-pending
    /// board, and its task is spawned on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_run(&self, request: RunRequest) -> Result<RunHandle, RunError> {
        let request = request.validate()?;
        let model = request.model;

        let run = Arc::new(RunShared::new(
            Uuid::now_v7(),
            model.id.clone(),
            self.registry.initial_states(),
            self.sink.clone(),
        ));

        let previous = self.current.lock().replace(run.clone());
        if let Some(previous) = previous.filter(|previous| !previous.is_finished()) {
            previous.discard("superseded");
        }

        run.publish(&PipelineEvent::started(run.id, model.id.clone()));
        info!(
            run_id = %run.id,
            model = %model.id,
            image = %request.image,
            patient_id = %request.patient.id,
            "Run started"
        );

        let span = info_span!("run", run_id = %run.id, model = %model.id);
        let orchestrator = self.orchestrator.clone();
        let task_run = run.clone();
        let task = tokio::spawn(
            async move {
                let outcome = AssertUnwindSafe(orchestrator.run(&task_run, &model))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(RunError::AnalysisFailed {
                            stage_id: None,
                            reason: panic_message(panic.as_ref()),
                        })
                    });

                match &outcome {
                    Err(RunError::AnalysisFailed { stage_id, reason }) => {
                        error!(stage_id = ?stage_id, %reason, "Run failed");
                        task_run.publish(&PipelineEvent::RunFailed {
                            run_id: task_run.id,
                            stage_id: *stage_id,
                            error: reason.clone(),
                        });
                    }
                    Err(err) => debug!(error = %err, "Run ended without result"),
                    Ok(_) => {}
                }
                task_run.mark_finished();
                outcome
            }
            .instrument(span),
        );

        Ok(RunHandle::new(run, task))
    }

    /// Discards the current run, if any, returning every stage to `pending`.
    ///
    /// Updates from the discarded run's executor are dropped from this point
    /// on. Returns the id of the discarded run.
    pub fn reset(&self) -> Option<Uuid> {
        let run = self.current.lock().take()?;
        run.discard("reset");
        Some(run.id)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "run task panicked".to_string())
}

/// Builder for [`PipelineRunner`].
pub struct PipelineRunnerBuilder {
    config: RunnerConfig,
    registry: Option<StageRegistry>,
    durations: Option<Arc<dyn DurationSource>>,
    sink: Option<Arc<dyn EventSink>>,
    synthesizer: Option<Arc<dyn ResultSynthesizer>>,
    faults: Option<Arc<dyn FaultInjector>>,
}

impl Default for PipelineRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRunnerBuilder {
    /// Creates a builder with default configuration and collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
            registry: None,
            durations: None,
            sink: None,
            synthesizer: None,
            faults: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the stage registry.
    #[must_use]
    pub fn registry(mut self, registry: StageRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the duration source. Defaults to a uniform draw over the
    /// configured bounds.
    #[must_use]
    pub fn duration_source(mut self, source: Arc<dyn DurationSource>) -> Self {
        self.durations = Some(source);
        self
    }

    /// Sets the event sink. Defaults to a no-op sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the result synthesizer. Defaults to the canned synthesizer.
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn ResultSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Installs a fault injector. Defaults to no faults.
    #[must_use]
    pub fn fault_injector(mut self, faults: Arc<dyn FaultInjector>) -> Self {
        self.faults = Some(faults);
        self
    }

    /// Builds the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<PipelineRunner, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let registry = Arc::new(self.registry.unwrap_or_default());
        let durations = self.durations.unwrap_or_else(|| {
            Arc::new(UniformDurationSource::from_millis(
                config.min_stage_duration_ms,
                config.max_stage_duration_ms,
            ))
        });
        let synthesizer = self.synthesizer.unwrap_or_else(|| {
            Arc::new(CannedResultSynthesizer::new(config.findings_per_result))
        });
        let faults = self.faults.unwrap_or_else(|| Arc::new(NoFaults));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NoOpEventSink));

        let orchestrator = Orchestrator {
            registry: registry.clone(),
            executor: StageExecutor::new(config.tick_interval()).with_faults(faults),
            durations,
            synthesizer,
            skipped_stage_secs: config.skipped_stage_duration_secs,
            stage_timeout: config.stage_timeout(),
            max_stage_duration: Duration::from_millis(config.max_stage_duration_ms),
        };

        Ok(PipelineRunner {
            config,
            registry,
            orchestrator,
            sink,
            current: Mutex::new(None),
        })
    }
}
