//! Machine-learning subsystem
//!
//! Two independent pre-trained ONNX models behind one gateway: a tabular
//! heart-risk classifier and a four-class MRI CNN. Models load lazily on
//! first use and stay resident for the process lifetime.

pub mod schema;
pub mod features;
pub mod heart;
pub mod brain;
pub mod interpret;

use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::config::Config;
use brain::BrainModel;
use heart::HeartModel;

/// Inference-side error taxonomy.
///
/// `ImageMissing` and `ImageUnreadable` are caller-input problems; the rest
/// are internal faults and must not leak detail to the end caller.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("image file not found")]
    ImageMissing(PathBuf),

    #[error("image could not be decoded: {0}")]
    ImageUnreadable(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Shared gateway over both models.
///
/// Explicitly constructed and handed to the router state; the once-cells
/// guarantee a single load even under concurrent first requests.
pub struct ModelGateway {
    heart_path: PathBuf,
    brain_path: PathBuf,
    heart: OnceCell<HeartModel>,
    brain: OnceCell<BrainModel>,
}

impl ModelGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            heart_path: config.heart_model_path.clone(),
            brain_path: config.brain_model_path.clone(),
            heart: OnceCell::new(),
            brain: OnceCell::new(),
        }
    }

    /// The heart model, loading it on first call
    pub fn heart(&self) -> Result<&HeartModel, ModelError> {
        self.heart.get_or_try_init(|| HeartModel::load(&self.heart_path))
    }

    /// The brain model, loading it on first call
    pub fn brain(&self) -> Result<&BrainModel, ModelError> {
        self.brain.get_or_try_init(|| BrainModel::load(&self.brain_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_with_missing_artifacts() -> ModelGateway {
        ModelGateway {
            heart_path: PathBuf::from("/nonexistent/heart.onnx"),
            brain_path: PathBuf::from("/nonexistent/brain.onnx"),
            heart: OnceCell::new(),
            brain: OnceCell::new(),
        }
    }

    #[test]
    fn test_missing_artifact_is_reported_on_first_use() {
        let gateway = gateway_with_missing_artifacts();
        assert!(matches!(
            gateway.heart().unwrap_err(),
            ModelError::ArtifactMissing(_)
        ));
        assert!(matches!(
            gateway.brain().unwrap_err(),
            ModelError::ArtifactMissing(_)
        ));
    }

    #[test]
    fn test_failed_load_is_retried_on_next_call() {
        // A load failure must not poison the cell
        let gateway = gateway_with_missing_artifacts();
        assert!(gateway.heart().is_err());
        assert!(gateway.heart().is_err());
    }
}
