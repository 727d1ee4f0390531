//! Static configuration of the pipeline: stage definitions and models.

mod models;
mod stages;

pub use models::{AiModel, ModelCatalog, ModelKind};
pub use stages::{
    StageDefinition, StageRegistry, CLASSIFICATION, GRAD_CAM, MASK_GENERATION, REPORT_GENERATION,
};
