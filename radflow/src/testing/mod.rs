//! Testing utilities for radflow runs.
//!
//! This module provides:
//! - Fixtures (demo patient, sample requests, a wired test harness)
//! - Test doubles for runner collaborators
//! - Assertions over published event streams

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_progress_monotonic, assert_run_events, assert_stage_skipped, assert_stages_sequential,
    stage_updates, transitions,
};
pub use fixtures::{
    catalog_model, demo_patient, mask_model, maskless_model, sample_image, sample_request,
    TestHarness,
};
pub use mocks::{CountingDurationSource, PanickingSynthesizer};
