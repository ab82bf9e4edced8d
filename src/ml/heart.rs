//! Heart-disease risk model
//!
//! Wraps the exported tabular classifier. The artifact is an ONNX graph
//! taking a `[1, FEATURE_COUNT]` f32 tensor and emitting a `[1, 2]` class
//! probability tensor (no-disease, disease).

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use super::schema::FEATURE_COUNT;
use super::ModelError;

/// Probability below this is Low risk
pub const MEDIUM_RISK_THRESHOLD: f32 = 0.40;
/// Probability at or above this is High risk
pub const HIGH_RISK_THRESHOLD: f32 = 0.70;

/// Discretized risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Discretize a disease probability into a tier
    pub fn from_probability(probability: f32) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one heart-risk inference
#[derive(Debug, Clone, Serialize)]
pub struct HeartPrediction {
    pub risk_label: RiskLabel,
    /// Disease probability in [0, 1]
    pub probability: f32,
}

/// Loaded heart model. Inference needs exclusive session access, hence the
/// lock; the instance itself is shared process-wide by the gateway.
#[derive(Debug)]
pub struct HeartModel {
    session: Mutex<Session>,
}

impl HeartModel {
    /// Load the ONNX artifact. Missing file is fatal for the heart path.
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::ArtifactMissing(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Inference(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Inference(format!("optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Inference(format!("load model: {}", e)))?;

        tracing::info!("Heart model loaded from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Run inference on one normalized feature vector.
    ///
    /// Deterministic: identical inputs always map to identical outputs, the
    /// model is fixed for the process lifetime.
    pub fn predict(&self, features: &FeatureVector) -> Result<HeartPrediction, ModelError> {
        features
            .validate()
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let input_array = Array2::<f32>::from_shape_vec(
            (1, FEATURE_COUNT),
            features.as_slice().to_vec(),
        )
        .map_err(|e| ModelError::Inference(format!("input shape: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError::Inference(format!("input tensor: {}", e)))?;

        let mut session = self.session.lock();

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| ModelError::Inference("model defines no output".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("run: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ModelError::Inference("missing output tensor".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("extract output: {}", e)))?;
        let data = output_tensor.1;

        // [no-disease, disease] probabilities; single-output graphs emit the
        // disease probability alone
        let probability = match data.len() {
            0 => return Err(ModelError::Inference("empty output tensor".to_string())),
            1 => data[0],
            _ => data[1],
        }
        .clamp(0.0, 1.0);

        Ok(HeartPrediction {
            risk_label: RiskLabel::from_probability(probability),
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_label_tiers() {
        assert_eq!(RiskLabel::from_probability(0.0), RiskLabel::Low);
        assert_eq!(RiskLabel::from_probability(0.39), RiskLabel::Low);
        assert_eq!(RiskLabel::from_probability(0.40), RiskLabel::Medium);
        assert_eq!(RiskLabel::from_probability(0.69), RiskLabel::Medium);
        assert_eq!(RiskLabel::from_probability(0.70), RiskLabel::High);
        assert_eq!(RiskLabel::from_probability(1.0), RiskLabel::High);
    }

    #[test]
    fn test_risk_label_strings() {
        assert_eq!(RiskLabel::Low.as_str(), "Low");
        assert_eq!(RiskLabel::Medium.as_str(), "Medium");
        assert_eq!(RiskLabel::High.as_str(), "High");
    }

    #[test]
    fn test_load_missing_artifact() {
        let err = HeartModel::load(Path::new("/nonexistent/heart.onnx")).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactMissing(_)));
    }
}
