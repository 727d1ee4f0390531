//! Inputs of a pipeline run and the precondition gate.

use crate::errors::{Requirement, RunError};
use crate::registry::AiModel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to the uploaded image (path, URL or sample name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    /// Creates a handle.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the source string.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Patient gender as entered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    #[default]
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Patient metadata attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    /// Patient identifier.
    pub id: String,
    /// Patient name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Gender.
    #[serde(default)]
    pub gender: Gender,
    /// Study date (`YYYY-MM-DD`).
    #[serde(default)]
    pub study_date: String,
    /// Imaging modality.
    #[serde(default)]
    pub modality: String,
    /// Accession number.
    #[serde(default)]
    pub accession_number: String,
    /// Referring physician.
    #[serde(default)]
    pub referring_physician: String,
}

impl PatientInfo {
    /// Creates patient info with the required fields; the rest are empty.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            gender: Gender::default(),
            study_date: String::new(),
            modality: String::new(),
            accession_number: String::new(),
            referring_physician: String::new(),
        }
    }

    /// Sets the gender.
    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Sets the study date.
    #[must_use]
    pub fn with_study_date(mut self, date: impl Into<String>) -> Self {
        self.study_date = date.into();
        self
    }

    /// Sets the modality.
    #[must_use]
    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = modality.into();
        self
    }

    /// Sets the accession number.
    #[must_use]
    pub fn with_accession_number(mut self, accession: impl Into<String>) -> Self {
        self.accession_number = accession.into();
        self
    }

    /// Sets the referring physician.
    #[must_use]
    pub fn with_referring_physician(mut self, physician: impl Into<String>) -> Self {
        self.referring_physician = physician.into();
        self
    }

    /// Returns true if the required fields (id and name) are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Everything a run needs. Any field may be absent; [`RunRequest::validate`]
/// gates the run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    image: Option<ImageHandle>,
    model: Option<AiModel>,
    patient: Option<PatientInfo>,
}

/// A request whose preconditions hold.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// The uploaded image.
    pub image: ImageHandle,
    /// The selected model.
    pub model: AiModel,
    /// The patient.
    pub patient: PatientInfo,
}

impl RunRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: ImageHandle) -> Self {
        self.image = Some(image);
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: AiModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the patient.
    #[must_use]
    pub fn with_patient(mut self, patient: PatientInfo) -> Self {
        self.patient = Some(patient);
        self
    }

    /// Returns the selected model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&AiModel> {
        self.model.as_ref()
    }

    /// Returns the image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    /// Returns the patient, if any.
    #[must_use]
    pub fn patient(&self) -> Option<&PatientInfo> {
        self.patient.as_ref()
    }

    /// Lists the unmet preconditions, in a stable order.
    #[must_use]
    pub fn missing(&self) -> Vec<Requirement> {
        let mut missing = Vec::new();
        if self.image.is_none() {
            missing.push(Requirement::Image);
        }
        if self.model.is_none() {
            missing.push(Requirement::Model);
        }
        if !self.patient.as_ref().is_some_and(PatientInfo::is_complete) {
            missing.push(Requirement::PatientInfo);
        }
        missing
    }

    /// Checks the preconditions without side effects.
    pub fn validate(self) -> Result<ValidatedRequest, RunError> {
        match (self.image, self.model, self.patient) {
            (Some(image), Some(model), Some(patient)) if patient.is_complete() => {
                Ok(ValidatedRequest {
                    image,
                    model,
                    patient,
                })
            }
            (image, model, patient) => Err(RunError::MissingRequirements {
                missing: Self {
                    image,
                    model,
                    patient,
                }
                .missing(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelCatalog;
    use pretty_assertions::assert_eq;

    fn model() -> AiModel {
        ModelCatalog::default().get("yolo-nodule").unwrap().clone()
    }

    #[test]
    fn test_complete_request_validates() {
        let validated = RunRequest::new()
            .with_image(ImageHandle::new("chest.png"))
            .with_model(model())
            .with_patient(PatientInfo::new("PAT-1", "Demo Patient", 58))
            .validate()
            .unwrap();
        assert_eq!(validated.image.source(), "chest.png");
        assert_eq!(validated.model.id, "yolo-nodule");
    }

    #[test]
    fn test_empty_request_lists_everything() {
        let err = RunRequest::new().validate().unwrap_err();
        assert_eq!(
            err,
            RunError::MissingRequirements {
                missing: vec![Requirement::Image, Requirement::Model, Requirement::PatientInfo]
            }
        );
    }

    #[test]
    fn test_blank_patient_counts_as_missing() {
        let request = RunRequest::new()
            .with_image(ImageHandle::new("chest.png"))
            .with_model(model())
            .with_patient(PatientInfo::new("  ", "Demo Patient", 58));
        assert_eq!(request.missing(), vec![Requirement::PatientInfo]);
    }

    #[test]
    fn test_patient_builder() {
        let patient = PatientInfo::new("PAT-2024-001234", "Demo Patient", 58)
            .with_gender(Gender::Female)
            .with_modality("CR (Computed Radiography)")
            .with_accession_number("ACC-2024-56789")
            .with_referring_physician("Dr. Sarah Mitchell")
            .with_study_date("2024-06-01");
        assert!(patient.is_complete());
        assert_eq!(patient.gender.to_string(), "female");

        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["accession_number"], "ACC-2024-56789");
    }
}
