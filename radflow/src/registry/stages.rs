//! Stage definitions and the skip predicate.

use super::models::AiModel;
use crate::core::{StageId, StageRuntimeState};
use serde::{Deserialize, Serialize};

/// The mask generation stage, skippable for models without a mask.
pub const MASK_GENERATION: StageId = StageId::new(1);
/// Classifier inference.
pub const CLASSIFICATION: StageId = StageId::new(2);
/// Heatmap generation.
pub const GRAD_CAM: StageId = StageId::new(3);
/// Report compilation.
pub const REPORT_GENERATION: StageId = StageId::new(4);

/// Immutable definition of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Unique id, defines execution order.
    pub id: StageId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
}

impl StageDefinition {
    /// Creates a stage definition.
    #[must_use]
    pub fn new(id: StageId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ordered, fixed set of stage definitions.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<StageDefinition>,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new(vec![
            StageDefinition::new(
                MASK_GENERATION,
                "Mask Generation",
                "U-Net automatic segmentation for lung field extraction",
            ),
            StageDefinition::new(
                CLASSIFICATION,
                "Classification Analysis",
                "Deep learning model inference for pathology detection",
            ),
            StageDefinition::new(
                GRAD_CAM,
                "Grad-CAM Generation",
                "Explainable AI heatmap visualization",
            ),
            StageDefinition::new(
                REPORT_GENERATION,
                "Report Generation",
                "Comprehensive medical report compilation",
            ),
        ])
    }
}

impl StageRegistry {
    /// Creates a registry, ordering the definitions by id.
    #[must_use]
    pub fn new(mut stages: Vec<StageDefinition>) -> Self {
        stages.sort_by_key(|s| s.id);
        stages.dedup_by_key(|s| s.id);
        Self { stages }
    }

    /// Returns the definitions in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the registry has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Looks up a stage definition by id.
    #[must_use]
    pub fn get(&self, id: StageId) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Returns whether a stage must run for the given model.
    ///
    /// Only mask generation is conditional: it runs iff the model requires a mask.
    #[must_use]
    pub fn is_required(&self, id: StageId, model: &AiModel) -> bool {
        if id == MASK_GENERATION {
            model.requires_mask
        } else {
            true
        }
    }

    /// Returns a fresh `pending` state for every stage.
    #[must_use]
    pub fn initial_states(&self) -> Vec<StageRuntimeState> {
        self.stages
            .iter()
            .map(|s| StageRuntimeState::pending(s.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::registry::ModelCatalog;

    #[test]
    fn test_default_registry_order() {
        let registry = StageRegistry::default();
        let ids: Vec<u32> = registry.stages().iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(registry.get(GRAD_CAM).unwrap().name, "Grad-CAM Generation");
    }

    #[test]
    fn test_registry_sorts_and_dedups() {
        let registry = StageRegistry::new(vec![
            StageDefinition::new(StageId::new(3), "c", ""),
            StageDefinition::new(StageId::new(1), "a", ""),
            StageDefinition::new(StageId::new(3), "dup", ""),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stages()[0].name, "a");
    }

    #[test]
    fn test_mask_stage_follows_model() {
        let registry = StageRegistry::default();
        let catalog = ModelCatalog::default();

        let unet = catalog.get("unet-chest").unwrap();
        let resnet = catalog.get("resnet-pneumonia").unwrap();

        assert!(!registry.is_required(MASK_GENERATION, unet));
        assert!(registry.is_required(MASK_GENERATION, resnet));
        for id in [CLASSIFICATION, GRAD_CAM, REPORT_GENERATION] {
            assert!(registry.is_required(id, unet));
            assert!(registry.is_required(id, resnet));
        }
    }

    #[test]
    fn test_initial_states_are_pending() {
        let states = StageRegistry::default().initial_states();
        assert_eq!(states.len(), 4);
        assert!(states.iter().all(|s| s.status == StageStatus::Pending && s.progress == 0));
    }
}
