//! Test fixtures for pipeline testing.

use std::sync::Arc;
use std::time::Duration;

use super::mocks::CountingDurationSource;
use crate::config::RunnerConfig;
use crate::errors::ConfigError;
use crate::events::{CollectingEventSink, EventSink};
use crate::pipeline::{Gender, ImageHandle, PatientInfo, PipelineRunner, PipelineRunnerBuilder, RunRequest};
use crate::registry::{AiModel, ModelCatalog};

/// The demo patient of the analysis form.
#[must_use]
pub fn demo_patient() -> PatientInfo {
    PatientInfo::new("PAT-2024-001234", "Demo Patient", 58)
        .with_gender(Gender::Male)
        .with_study_date("2024-06-01")
        .with_modality("CR (Computed Radiography)")
        .with_accession_number("ACC-2024-56789")
        .with_referring_physician("Dr. Sarah Mitchell")
}

/// The sample chest X-ray image.
#[must_use]
pub fn sample_image() -> ImageHandle {
    ImageHandle::new("samples/chest-xray-pa.png")
}

/// Looks up a model of the default catalog.
///
/// # Panics
///
/// Panics if `id` is not in the catalog.
#[must_use]
pub fn catalog_model(id: &str) -> AiModel {
    match ModelCatalog::default().get(id) {
        Some(model) => model.clone(),
        None => panic!("no model '{id}' in the default catalog"),
    }
}

/// A model that requires mask generation.
#[must_use]
pub fn mask_model() -> AiModel {
    catalog_model("resnet-pneumonia")
}

/// A model that skips mask generation.
#[must_use]
pub fn maskless_model() -> AiModel {
    catalog_model("yolo-nodule")
}

/// A complete request for `model`.
#[must_use]
pub fn sample_request(model: AiModel) -> RunRequest {
    RunRequest::new()
        .with_image(sample_image())
        .with_model(model)
        .with_patient(demo_patient())
}

/// A runner wired with a fixed stage duration and a collecting sink.
pub struct TestHarness {
    /// The runner under test.
    pub runner: PipelineRunner,
    /// Every published event.
    pub events: Arc<CollectingEventSink>,
    /// Records which stages were actually executed.
    pub durations: Arc<CountingDurationSource>,
}

impl TestHarness {
    /// Creates a harness whose stages each last `stage_duration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the default configuration is rejected.
    pub fn new(stage_duration: Duration) -> Result<Self, ConfigError> {
        Self::with_builder(stage_duration, |builder| builder)
    }

    /// Creates a harness, letting `customize` adjust the runner builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid.
    pub fn with_builder<F>(stage_duration: Duration, customize: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(PipelineRunnerBuilder) -> PipelineRunnerBuilder,
    {
        let events = Arc::new(CollectingEventSink::new());
        let durations = Arc::new(CountingDurationSource::new(stage_duration));
        let builder = PipelineRunner::builder()
            .config(RunnerConfig::default())
            .duration_source(durations.clone())
            .event_sink(events.clone() as Arc<dyn EventSink>);
        let runner = customize(builder).build()?;

        Ok(Self {
            runner,
            events,
            durations,
        })
    }
}
