//! The terminal artifact of a completed run.

use super::finding::{Finding, Severity};
use crate::core::StageId;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};

/// Recorded duration of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// The stage.
    pub stage_id: StageId,
    /// Simulated duration in seconds.
    pub duration_seconds: f64,
}

/// The result of one completed run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Identifier of the form `analysis-<uuid>`.
    pub id: String,
    /// Id of the model that produced the result.
    pub model_id: String,
    /// Display label of the model.
    pub model_name: String,
    /// Ordered findings.
    pub findings: Vec<Finding>,
    /// Overall confidence in `[0, 1]`.
    pub confidence: f64,
    /// Total elapsed processing time in seconds.
    pub processing_time: f64,
    /// Per-stage simulated durations in execution order.
    #[serde(default)]
    pub stage_timings: Vec<StageTiming>,
    /// Creation time.
    pub created_at: Timestamp,
}

impl RunResult {
    /// Returns the most severe finding, if any.
    #[must_use]
    pub fn most_severe(&self) -> Option<&Finding> {
        self.findings.iter().max_by_key(|f| f.severity)
    }

    /// Returns true if any finding is above `normal`.
    #[must_use]
    pub fn has_abnormal_findings(&self) -> bool {
        self.findings.iter().any(|f| f.severity > Severity::Normal)
    }

    /// Sum of the recorded stage durations in seconds.
    #[must_use]
    pub fn simulated_stage_seconds(&self) -> f64 {
        self.stage_timings.iter().map(|t| t.duration_seconds).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::canned_findings;

    fn sample() -> RunResult {
        RunResult {
            id: "analysis-test".to_string(),
            model_id: "resnet-pneumonia".to_string(),
            model_name: "ResNet-50 Pneumonia Classifier".to_string(),
            findings: canned_findings(),
            confidence: 0.9,
            processing_time: 8.0,
            stage_timings: vec![
                StageTiming { stage_id: StageId::new(1), duration_seconds: 0.1 },
                StageTiming { stage_id: StageId::new(2), duration_seconds: 2.0 },
            ],
            created_at: crate::utils::now_utc(),
        }
    }

    #[test]
    fn test_most_severe() {
        let result = sample();
        assert_eq!(result.most_severe().unwrap().condition, "Cardiomegaly");
        assert!(result.has_abnormal_findings());
    }

    #[test]
    fn test_simulated_stage_seconds() {
        assert!((sample().simulated_stage_seconds() - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_result_serialization_round_trip() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
