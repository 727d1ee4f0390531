//! Live progress bars driven by pipeline events.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use radflow::core::{PipelineEvent, StageId, StageStatus};
use radflow::events::EventSink;
use radflow::registry::StageRegistry;
use std::collections::HashMap;
use std::io;

/// Renders one bar per stage and follows `stage.updated` events.
pub struct StageProgress {
    multi: MultiProgress,
    bars: HashMap<StageId, ProgressBar>,
}

impl StageProgress {
    /// Creates bars for every stage of `registry`. Hidden bars draw nothing.
    pub fn new(registry: &StageRegistry, hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let bars = registry
            .stages()
            .iter()
            .map(|stage| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(stage_style());
                bar.set_prefix(format!("[{}/{}] {}", stage.id, registry.len(), stage.name));
                bar.set_message(StageStatus::Pending.to_string());
                (stage.id, bar)
            })
            .collect();

        Self { multi, bars }
    }

    /// Current position of a stage's bar.
    pub fn position(&self, stage_id: StageId) -> Option<u64> {
        self.bars.get(&stage_id).map(ProgressBar::position)
    }

    /// Stops drawing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal could not be cleared.
    pub fn clear(&self) -> io::Result<()> {
        for bar in self.bars.values() {
            bar.finish_and_clear();
        }
        self.multi.clear()
    }
}

fn stage_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:32} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

impl EventSink for StageProgress {
    fn try_emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageUpdated { stage_id, state, .. } => {
                let Some(bar) = self.bars.get(stage_id) else {
                    return;
                };
                bar.set_position(u64::from(state.progress));
                match (state.status, state.duration_seconds) {
                    (StageStatus::Completed, Some(secs)) => {
                        bar.finish_with_message(format!("completed in {secs:.1}s"));
                    }
                    (StageStatus::Error, _) => bar.abandon_with_message("error"),
                    (status, _) => bar.set_message(status.to_string()),
                }
            }
            PipelineEvent::RunReset { reason, .. } => {
                for bar in self.bars.values() {
                    bar.abandon_with_message(format!("reset ({reason})"));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radflow::core::StageRuntimeState;
    use uuid::Uuid;

    #[test]
    fn test_bars_follow_stage_updates() {
        let progress = StageProgress::new(&StageRegistry::default(), true);

        progress.try_emit(&PipelineEvent::stage_updated(
            Uuid::nil(),
            StageRuntimeState::processing(StageId::new(2), 42),
        ));
        assert_eq!(progress.position(StageId::new(2)), Some(42));

        progress.try_emit(&PipelineEvent::stage_updated(
            Uuid::nil(),
            StageRuntimeState::completed(StageId::new(2), 2.0),
        ));
        assert_eq!(progress.position(StageId::new(2)), Some(100));
        assert_eq!(progress.position(StageId::new(3)), Some(0));
        assert_eq!(progress.position(StageId::new(9)), None);

        progress.try_emit(&PipelineEvent::RunReset {
            run_id: Uuid::nil(),
            reason: "reset".to_string(),
        });
        progress.clear().unwrap();
    }
}
