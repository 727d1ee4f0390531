//! Error types for radflow.

use crate::core::StageId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An input that must be present before a run can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// An uploaded image.
    Image,
    /// A selected model.
    Model,
    /// Patient metadata with id and name filled in.
    PatientInfo,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Model => write!(f, "model"),
            Self::PatientInfo => write!(f, "patient info"),
        }
    }
}

fn join_requirements(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn stage_suffix(stage_id: &Option<StageId>) -> String {
    stage_id.map(|id| format!(" at stage {id}")).unwrap_or_default()
}

/// Errors reported to the caller of a pipeline run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunError {
    /// Preconditions were not met; nothing was started or mutated.
    #[error("Missing requirements: {}", join_requirements(.missing))]
    MissingRequirements {
        /// What is missing, in a stable order.
        missing: Vec<Requirement>,
    },

    /// The stage loop faulted. Completed stages remain visible; no result is produced.
    #[error("Analysis failed{}: {reason}", stage_suffix(.stage_id))]
    AnalysisFailed {
        /// The stage that faulted, if the fault is attributable to one.
        stage_id: Option<StageId>,
        /// What went wrong.
        reason: String,
    },

    /// The run was reset or superseded before it finished.
    #[error("Run cancelled: {reason}")]
    Cancelled {
        /// The cancellation reason.
        reason: String,
    },
}

impl RunError {
    /// Creates an analysis failure attributed to a stage.
    #[must_use]
    pub fn stage_failed(stage_id: StageId, reason: impl Into<String>) -> Self {
        Self::AnalysisFailed {
            stage_id: Some(stage_id),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a precondition failure.
    #[must_use]
    pub fn is_missing_requirements(&self) -> bool {
        matches!(self, Self::MissingRequirements { .. })
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors raised while loading or validating runner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed.
    #[error("Invalid configuration format: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment override held an unparsable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv {
        /// The environment variable.
        key: String,
        /// The offending value.
        value: String,
    },

    /// A setting is out of range.
    #[error("Invalid setting '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it is invalid.
        message: String,
    },
}

impl ConfigError {
    /// Creates a range/consistency error for a field.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_requirements_message() {
        let err = RunError::MissingRequirements {
            missing: vec![Requirement::Image, Requirement::PatientInfo],
        };
        assert_eq!(err.to_string(), "Missing requirements: image, patient info");
        assert!(err.is_missing_requirements());
    }

    #[test]
    fn test_analysis_failed_message() {
        let err = RunError::stage_failed(StageId::new(2), "simulated timeout");
        assert_eq!(err.to_string(), "Analysis failed at stage 2: simulated timeout");

        let err = RunError::AnalysisFailed {
            stage_id: None,
            reason: "panic".to_string(),
        };
        assert_eq!(err.to_string(), "Analysis failed: panic");
    }

    #[test]
    fn test_cancelled() {
        let err = RunError::Cancelled {
            reason: "reset".to_string(),
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Run cancelled: reset");
    }

    #[test]
    fn test_config_error_from_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid configuration format"));
    }
}
