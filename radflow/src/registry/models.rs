//! Mock AI model catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of analysis a model performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Region segmentation.
    Segmentation,
    /// Pathology classification.
    Classification,
    /// Lesion detection and localization.
    Detection,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segmentation => write!(f, "segmentation"),
            Self::Classification => write!(f, "classification"),
            Self::Detection => write!(f, "detection"),
        }
    }
}

/// A selectable (simulated) AI model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiModel {
    /// Stable identifier (e.g. "resnet-pneumonia").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Model kind.
    pub kind: ModelKind,
    /// Whether the mask generation stage must run first.
    pub requires_mask: bool,
}

impl AiModel {
    /// Creates a model description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: ModelKind,
        requires_mask: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            requires_mask,
        }
    }
}

/// The fixed set of models offered to the user.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<AiModel>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            models: vec![
                AiModel::new(
                    "unet-chest",
                    "U-Net Chest X-Ray Segmentation",
                    "Automatic lung field and cardiac silhouette segmentation",
                    ModelKind::Segmentation,
                    false,
                ),
                AiModel::new(
                    "resnet-pneumonia",
                    "ResNet-50 Pneumonia Classifier",
                    "Deep learning model for pneumonia detection",
                    ModelKind::Classification,
                    true,
                ),
                AiModel::new(
                    "densenet-multi",
                    "DenseNet-121 Multi-Label Classifier",
                    "Detects 14 thoracic pathologies including cardiomegaly, effusion, and nodules",
                    ModelKind::Classification,
                    true,
                ),
                AiModel::new(
                    "efficientnet-covid",
                    "EfficientNet COVID-19 Detector",
                    "Specialized model for COVID-19 pneumonia patterns",
                    ModelKind::Classification,
                    true,
                ),
                AiModel::new(
                    "yolo-nodule",
                    "YOLO Lung Nodule Detector",
                    "Real-time nodule detection and localization",
                    ModelKind::Detection,
                    false,
                ),
            ],
        }
    }
}

impl ModelCatalog {
    /// Returns all models.
    #[must_use]
    pub fn models(&self) -> &[AiModel] {
        &self.models
    }

    /// Looks up a model by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AiModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Returns the ids of all models.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contents() {
        let catalog = ModelCatalog::default();
        assert_eq!(
            catalog.ids(),
            vec![
                "unet-chest",
                "resnet-pneumonia",
                "densenet-multi",
                "efficientnet-covid",
                "yolo-nodule"
            ]
        );
    }

    #[test]
    fn test_mask_requirements() {
        let catalog = ModelCatalog::default();
        let without_mask: Vec<&str> = catalog
            .models()
            .iter()
            .filter(|m| !m.requires_mask)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(without_mask, vec!["unet-chest", "yolo-nodule"]);
    }

    #[test]
    fn test_unknown_model() {
        assert!(ModelCatalog::default().get("gpt-xray").is_none());
    }

    #[test]
    fn test_model_kind_serialize() {
        let json = serde_json::to_string(&ModelKind::Detection).unwrap();
        assert_eq!(json, r#""detection""#);
        assert_eq!(ModelKind::Segmentation.to_string(), "segmentation");
    }
}
