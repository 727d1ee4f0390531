//! Result synthesis: the terminal step after all stages complete.

use super::finding::{canned_findings, Finding};
use super::result::{RunResult, StageTiming};
use crate::registry::AiModel;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use uuid::Uuid;

/// Produces the [`RunResult`] for a run whose stages all completed.
#[cfg_attr(test, mockall::automock)]
pub trait ResultSynthesizer: Send + Sync {
    /// Builds the result for `model`.
    fn synthesize(
        &self,
        model: &AiModel,
        processing_time: Duration,
        stage_timings: &[StageTiming],
    ) -> RunResult;
}

/// Fabricates results from the canned finding pool.
#[derive(Debug)]
pub struct CannedResultSynthesizer {
    pool: Vec<Finding>,
    findings_per_result: usize,
    rng: Mutex<StdRng>,
}

impl Default for CannedResultSynthesizer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl CannedResultSynthesizer {
    /// Lower bound of the fabricated confidence.
    pub const MIN_CONFIDENCE: f64 = 0.85;
    /// Upper bound (exclusive) of the fabricated confidence.
    pub const MAX_CONFIDENCE: f64 = 0.95;

    /// Creates a synthesizer drawing `findings_per_result` findings per run.
    #[must_use]
    pub fn new(findings_per_result: usize) -> Self {
        Self {
            pool: canned_findings(),
            findings_per_result,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Makes the draws reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Replaces the finding pool.
    #[must_use]
    pub fn with_pool(mut self, pool: Vec<Finding>) -> Self {
        self.pool = pool;
        self
    }
}

impl ResultSynthesizer for CannedResultSynthesizer {
    fn synthesize(
        &self,
        model: &AiModel,
        processing_time: Duration,
        stage_timings: &[StageTiming],
    ) -> RunResult {
        let mut rng = self.rng.lock();
        let findings = self
            .pool
            .choose_multiple(&mut *rng, self.findings_per_result)
            .cloned()
            .collect();
        let confidence = rng.gen_range(Self::MIN_CONFIDENCE..Self::MAX_CONFIDENCE);

        RunResult {
            id: format!("analysis-{}", Uuid::now_v7()),
            model_id: model.id.clone(),
            model_name: model.name.clone(),
            findings,
            confidence,
            processing_time: processing_time.as_secs_f64(),
            stage_timings: stage_timings.to_vec(),
            created_at: crate::utils::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelCatalog;
    use std::collections::HashSet;

    fn model() -> AiModel {
        ModelCatalog::default().get("densenet-multi").unwrap().clone()
    }

    #[test]
    fn test_canned_result_shape() {
        let synth = CannedResultSynthesizer::default().with_seed(7);
        let result = synth.synthesize(&model(), Duration::from_millis(8000), &[]);

        assert_eq!(result.findings.len(), 3);
        assert_eq!(result.model_name, "DenseNet-121 Multi-Label Classifier");
        assert_eq!(result.model_id, "densenet-multi");
        assert!(result.id.starts_with("analysis-"));
        assert!((result.processing_time - 8.0).abs() < 1e-9);
        assert!(result.confidence >= CannedResultSynthesizer::MIN_CONFIDENCE);
        assert!(result.confidence < CannedResultSynthesizer::MAX_CONFIDENCE);
    }

    #[test]
    fn test_findings_are_distinct() {
        let synth = CannedResultSynthesizer::new(4).with_seed(1);
        let result = synth.synthesize(&model(), Duration::ZERO, &[]);
        let names: HashSet<_> = result.findings.iter().map(|f| f.condition.clone()).collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_each_result_has_new_id() {
        let synth = CannedResultSynthesizer::default();
        let a = synth.synthesize(&model(), Duration::ZERO, &[]);
        let b = synth.synthesize(&model(), Duration::ZERO, &[]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_request_above_pool_size_is_capped() {
        let synth = CannedResultSynthesizer::new(10);
        let result = synth.synthesize(&model(), Duration::ZERO, &[]);
        assert_eq!(result.findings.len(), 4);
    }
}
