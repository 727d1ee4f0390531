//! Findings reported by a (simulated) analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No abnormality.
    Normal,
    /// Mild abnormality.
    Mild,
    /// Moderate abnormality.
    Moderate,
    /// Severe abnormality.
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Mild => write!(f, "mild"),
            Self::Moderate => write!(f, "moderate"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Condition name.
    pub condition: String,
    /// Probability in `[0, 1]`.
    pub probability: f64,
    /// Severity grade.
    pub severity: Severity,
    /// Anatomical location, when localized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-text description.
    pub description: String,
}

impl Finding {
    /// Creates a finding.
    #[must_use]
    pub fn new(
        condition: impl Into<String>,
        probability: f64,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            condition: condition.into(),
            probability: probability.clamp(0.0, 1.0),
            severity,
            location: None,
            description: description.into(),
        }
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The canned pool the mock synthesizer draws from.
#[must_use]
pub fn canned_findings() -> Vec<Finding> {
    vec![
        Finding::new(
            "Cardiomegaly",
            0.87,
            Severity::Moderate,
            "Cardiothoracic ratio exceeds normal limits, suggesting cardiac enlargement.",
        )
        .with_location("Cardiac silhouette"),
        Finding::new(
            "Pleural Effusion",
            0.72,
            Severity::Mild,
            "Small amount of fluid accumulation in the right costophrenic angle.",
        )
        .with_location("Right lower lung field"),
        Finding::new(
            "Pulmonary Infiltrates",
            0.45,
            Severity::Mild,
            "Patchy opacity consistent with inflammatory process.",
        )
        .with_location("Left mid-lung zone"),
        Finding::new(
            "Normal Lung Fields",
            0.92,
            Severity::Normal,
            "No acute cardiopulmonary abnormality detected.",
        )
        .with_location("Bilateral"),
    ]
}
