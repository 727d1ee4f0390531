//! Pure progress computation for one stage execution.

use crate::core::{StageId, StageRuntimeState, PROGRESS_COMPLETE};
use std::time::Duration;
use tokio::time::Instant;

/// Progress percentage after `elapsed` of a stage lasting `duration`.
///
/// `min(100, floor(elapsed / duration * 100))`; a zero duration is complete
/// immediately.
#[must_use]
pub fn progress_at(elapsed: Duration, duration: Duration) -> u8 {
    if duration.is_zero() || elapsed >= duration {
        return PROGRESS_COMPLETE;
    }
    let percent = elapsed.as_nanos() * u128::from(PROGRESS_COMPLETE) / duration.as_nanos();
    // elapsed < duration, so percent < 100
    u8::try_from(percent).unwrap_or(PROGRESS_COMPLETE - 1)
}

/// Maps scheduler ticks to stage states for one execution.
///
/// The state is a function of `(started_at, now, duration)` only.
#[derive(Debug, Clone, Copy)]
pub struct StageTicker {
    stage_id: StageId,
    started_at: Instant,
    duration: Duration,
}

impl StageTicker {
    /// Creates a ticker for an execution that started at `started_at`.
    #[must_use]
    pub fn new(stage_id: StageId, started_at: Instant, duration: Duration) -> Self {
        Self {
            stage_id,
            started_at,
            duration,
        }
    }

    /// The simulated duration of this execution.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the stage state observed at `now`.
    #[must_use]
    pub fn tick(&self, now: Instant) -> StageRuntimeState {
        let elapsed = now.saturating_duration_since(self.started_at);
        let progress = progress_at(elapsed, self.duration);
        if progress >= PROGRESS_COMPLETE {
            StageRuntimeState::completed(self.stage_id, self.duration.as_secs_f64())
        } else {
            StageRuntimeState::processing(self.stage_id, progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;

    #[test]
    fn test_progress_at_floors() {
        let d = Duration::from_millis(2000);
        assert_eq!(progress_at(Duration::ZERO, d), 0);
        assert_eq!(progress_at(Duration::from_millis(19), d), 0);
        assert_eq!(progress_at(Duration::from_millis(20), d), 1);
        assert_eq!(progress_at(Duration::from_millis(1999), d), 99);
        assert_eq!(progress_at(Duration::from_millis(2000), d), 100);
        assert_eq!(progress_at(Duration::from_millis(5000), d), 100);
    }

    #[test]
    fn test_zero_duration_is_complete() {
        assert_eq!(progress_at(Duration::ZERO, Duration::ZERO), 100);
    }

    #[test]
    fn test_ticker_is_monotonic() {
        let start = Instant::now();
        let ticker = StageTicker::new(StageId::new(2), start, Duration::from_millis(1730));

        let mut last = 0;
        for ms in (0..=1800).step_by(16) {
            let state = ticker.tick(start + Duration::from_millis(ms));
            assert!(state.progress >= last);
            assert!(state.progress <= 100);
            last = state.progress;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_ticker_completion_records_duration() {
        let start = Instant::now();
        let ticker = StageTicker::new(StageId::new(3), start, Duration::from_millis(2250));

        let mid = ticker.tick(start + Duration::from_millis(1125));
        assert_eq!(mid.status, StageStatus::Processing);
        assert_eq!(mid.progress, 50);
        assert!(mid.duration_seconds.is_none());

        let done = ticker.tick(start + Duration::from_millis(2250));
        assert_eq!(done.status, StageStatus::Completed);
        assert_eq!(done.duration_seconds, Some(2.25));
    }

    #[test]
    fn test_tick_before_start_is_zero() {
        let start = Instant::now() + Duration::from_secs(1);
        let ticker = StageTicker::new(StageId::new(1), start, Duration::from_secs(2));
        assert_eq!(ticker.tick(Instant::now()).progress, 0);
    }
}
