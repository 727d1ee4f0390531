//! The stage state array of one run.

use crate::cancellation::CancellationToken;
use crate::core::{StageId, StageRuntimeState, StageStatus};
use parking_lot::{ReentrantMutex, RwLock};
use tracing::debug;

/// Per-run stage states, in stage id order.
///
/// Writes go through [`StageBoard::apply`], which checks the run's token
/// while holding the board's publish lock: once a reset has cancelled the
/// token, no later write can land, and events leave the board one at a time
/// in write order. The state lock itself is released before anything is
/// published, so observers may read the board (or reset the run) from inside
/// a publish callback.
#[derive(Debug)]
pub struct StageBoard {
    states: RwLock<Vec<StageRuntimeState>>,
    publishing: ReentrantMutex<()>,
}

impl StageBoard {
    /// Creates a board from initial states.
    #[must_use]
    pub fn new(states: Vec<StageRuntimeState>) -> Self {
        Self {
            states: RwLock::new(states),
            publishing: ReentrantMutex::new(()),
        }
    }

    /// Returns a copy of every stage state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StageRuntimeState> {
        self.states.read().clone()
    }

    /// Returns a copy of one stage state.
    #[must_use]
    pub fn get(&self, stage_id: StageId) -> Option<StageRuntimeState> {
        self.states
            .read()
            .iter()
            .find(|s| s.stage_id == stage_id)
            .cloned()
    }

    /// Returns true if every stage completed.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.states.read().iter().all(StageRuntimeState::is_completed)
    }

    /// Returns true if every stage is pending with zero progress.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.states
            .read()
            .iter()
            .all(|s| s.status == StageStatus::Pending && s.progress == 0)
    }

    /// Writes `state` unless `token` is cancelled, then calls `publish` with it.
    ///
    /// Returns false if the write was rejected.
    pub fn apply<F>(&self, state: StageRuntimeState, token: &CancellationToken, publish: F) -> bool
    where
        F: FnOnce(&StageRuntimeState),
    {
        let _publishing = self.publishing.lock();
        if token.is_cancelled() {
            debug!(stage_id = %state.stage_id, progress = state.progress, "Ignoring update for cancelled run");
            return false;
        }
        {
            let mut states = self.states.write();
            let Some(slot) = states.iter_mut().find(|s| s.stage_id == state.stage_id) else {
                debug!(stage_id = %state.stage_id, "Ignoring update for unknown stage");
                return false;
            };
            slot.clone_from(&state);
        }
        publish(&state);
        true
    }

    /// Calls `publish` in write order unless `token` is cancelled.
    pub fn publish_unless_cancelled<F>(&self, token: &CancellationToken, publish: F) -> bool
    where
        F: FnOnce(),
    {
        let _publishing = self.publishing.lock();
        if token.is_cancelled() {
            return false;
        }
        publish();
        true
    }

    /// Returns every stage to `pending`, then calls `publish`.
    pub fn reset<F>(&self, publish: F)
    where
        F: FnOnce(),
    {
        let _publishing = self.publishing.lock();
        {
            let mut states = self.states.write();
            for state in states.iter_mut() {
                *state = StageRuntimeState::pending(state.stage_id);
            }
        }
        publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StageRegistry;
    use pretty_assertions::assert_eq;

    fn board() -> StageBoard {
        StageBoard::new(StageRegistry::default().initial_states())
    }

    #[test]
    fn test_apply_and_snapshot() {
        let board = board();
        let token = CancellationToken::new();
        let mut published = Vec::new();

        assert!(board.apply(StageRuntimeState::processing(StageId::new(2), 40), &token, |s| {
            published.push(s.clone());
        }));

        assert_eq!(board.get(StageId::new(2)).unwrap().progress, 40);
        assert_eq!(published, vec![StageRuntimeState::processing(StageId::new(2), 40)]);
        assert!(!board.is_pristine());
    }

    #[test]
    fn test_cancelled_token_rejects_writes() {
        let board = board();
        let token = CancellationToken::new();
        token.cancel("reset");

        let mut published = false;
        assert!(!board.apply(StageRuntimeState::processing(StageId::new(1), 10), &token, |_| {
            published = true;
        }));
        assert!(!published);
        assert!(board.is_pristine());
        assert!(!board.publish_unless_cancelled(&token, || published = true));
        assert!(!published);
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let board = board();
        let token = CancellationToken::new();
        assert!(!board.apply(StageRuntimeState::processing(StageId::new(9), 10), &token, |_| {}));
    }

    #[test]
    fn test_reset_returns_everything_to_pending() {
        let board = board();
        let token = CancellationToken::new();
        for id in 1..=4 {
            board.apply(StageRuntimeState::completed(StageId::new(id), 2.0), &token, |_| {});
        }
        assert!(board.all_completed());

        let mut notified = false;
        board.reset(|| notified = true);

        assert!(notified);
        assert!(board.is_pristine());
        assert_eq!(board.snapshot(), StageRegistry::default().initial_states());
    }

    #[test]
    fn test_publish_callback_can_read_the_board() {
        let board = board();
        let token = CancellationToken::new();
        let mut seen = None;

        assert!(board.apply(StageRuntimeState::processing(StageId::new(3), 70), &token, |_| {
            seen = board.get(StageId::new(3));
        }));
        assert_eq!(seen, Some(StageRuntimeState::processing(StageId::new(3), 70)));

        let mut after_reset = Vec::new();
        board.reset(|| after_reset = board.snapshot());
        assert_eq!(after_reset, StageRegistry::default().initial_states());
    }
}
