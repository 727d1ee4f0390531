//! Assertions over published event streams.

use std::collections::HashMap;

use crate::core::{PipelineEvent, StageId, StageRuntimeState, StageStatus};

/// Returns the stage states carried by `stage.updated` events, in order.
#[must_use]
pub fn stage_updates(events: &[PipelineEvent]) -> Vec<StageRuntimeState> {
    events
        .iter()
        .filter_map(PipelineEvent::stage_state)
        .cloned()
        .collect()
}

/// Returns the `(stage, status)` transitions, dropping repeated statuses.
#[must_use]
pub fn transitions(events: &[PipelineEvent]) -> Vec<(StageId, StageStatus)> {
    let mut out: Vec<(StageId, StageStatus)> = Vec::new();
    for state in stage_updates(events) {
        let entry = (state.stage_id, state.status);
        if out.last() != Some(&entry) {
            out.push(entry);
        }
    }
    out
}

/// Asserts that stages enter `processing` in strictly increasing id order and
/// that no stage starts before every earlier stage completed.
pub fn assert_stages_sequential(events: &[PipelineEvent]) {
    let mut last_started: Option<StageId> = None;
    let mut completed: Vec<StageId> = Vec::new();

    for (stage_id, status) in transitions(events) {
        match status {
            StageStatus::Processing => {
                if let Some(previous) = last_started {
                    assert!(
                        stage_id > previous,
                        "Stage {stage_id} started after stage {previous}"
                    );
                    assert!(
                        completed.contains(&previous),
                        "Stage {stage_id} started before stage {previous} completed"
                    );
                }
                if let Some(latest) = completed.last() {
                    assert!(
                        stage_id > *latest,
                        "Stage {stage_id} started after stage {latest} completed"
                    );
                }
                last_started = Some(stage_id);
            }
            StageStatus::Completed => {
                if let Some(latest) = completed.last() {
                    assert!(
                        stage_id > *latest,
                        "Stage {stage_id} completed after stage {latest}"
                    );
                }
                completed.push(stage_id);
            }
            StageStatus::Pending | StageStatus::Error => {}
        }
    }
}

/// Asserts that every stage's observed progress is non-decreasing and within
/// `0..=100`.
pub fn assert_progress_monotonic(events: &[PipelineEvent]) {
    let mut last: HashMap<StageId, u8> = HashMap::new();
    for state in stage_updates(events) {
        assert!(state.progress <= 100, "Progress {} out of range", state.progress);
        if let Some(previous) = last.insert(state.stage_id, state.progress) {
            assert!(
                state.progress >= previous,
                "Stage {} progress went from {} to {}",
                state.stage_id,
                previous,
                state.progress
            );
        }
    }
}

/// Asserts that `stage_id` completed exactly once and never reported
/// `processing`.
pub fn assert_stage_skipped(events: &[PipelineEvent], stage_id: StageId) {
    let states: Vec<_> = stage_updates(events)
        .into_iter()
        .filter(|s| s.stage_id == stage_id)
        .collect();
    assert_eq!(
        states.len(),
        1,
        "Expected a single update for skipped stage {stage_id}, got {states:?}"
    );
    assert_eq!(states[0].status, StageStatus::Completed);
    assert_eq!(states[0].progress, 100);
}

/// Asserts that the event types match `expected` once `stage.updated` events
/// are removed.
pub fn assert_run_events(events: &[PipelineEvent], expected: &[&str]) {
    let actual: Vec<_> = events
        .iter()
        .map(PipelineEvent::event_type)
        .filter(|t| *t != "stage.updated")
        .collect();
    assert_eq!(actual, expected, "Unexpected run-level events");
}
