//! Sources of simulated stage durations.

use crate::core::StageId;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Chooses how long a stage execution lasts.
///
/// Called once per executed stage, at the moment the stage starts.
pub trait DurationSource: Send + Sync {
    /// Returns the duration for the next execution of `stage_id`.
    fn next_duration(&self, stage_id: StageId) -> Duration;
}

impl<F> DurationSource for F
where
    F: Fn(StageId) -> Duration + Send + Sync,
{
    fn next_duration(&self, stage_id: StageId) -> Duration {
        self(stage_id)
    }
}

/// Draws durations uniformly from `[min, max)`.
#[derive(Debug)]
pub struct UniformDurationSource {
    min: Duration,
    max: Duration,
    rng: Mutex<StdRng>,
}

impl UniformDurationSource {
    /// Creates a uniform source. An empty range always yields `min`.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a source from millisecond bounds.
    #[must_use]
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// Makes the draws reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }
}

impl DurationSource for UniformDurationSource {
    fn next_duration(&self, _stage_id: StageId) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        self.rng.lock().gen_range(self.min..self.max)
    }
}

/// Always returns the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationSource(pub Duration);

impl FixedDurationSource {
    /// Creates a fixed source from milliseconds.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

impl DurationSource for FixedDurationSource {
    fn next_duration(&self, _stage_id: StageId) -> Duration {
        self.0
    }
}
