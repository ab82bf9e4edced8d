//! Brain-tumor MRI model
//!
//! Four-class CNN over MRI scans. The artifact is an ONNX graph taking a
//! `[1, 224, 224, 3]` f32 tensor (RGB, scaled to [0, 1]) and emitting one
//! logit per class; the distribution is softmaxed here.

use std::collections::BTreeMap;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::Serialize;

use super::ModelError;

/// Class names in the training directory order
pub const BRAIN_CLASSES: &[&str] = &["glioma", "meningioma", "no_tumor", "pituitary"];

/// Model input edge length in pixels
pub const IMAGE_SIZE: u32 = 224;

/// Outcome of one MRI inference
#[derive(Debug, Clone, Serialize)]
pub struct BrainPrediction {
    pub predicted_class: String,
    /// Probability of the predicted class, in [0, 1]
    pub probability: f32,
    /// Full distribution over all classes
    pub probabilities: BTreeMap<String, f32>,
    pub is_tumor: bool,
}

/// Whether a class name denotes a tumor finding
pub fn is_tumor_class(class: &str) -> bool {
    matches!(class, "glioma" | "meningioma" | "pituitary")
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|v| v / sum).collect()
}

/// Decode an MRI image from disk.
///
/// A missing file and an undecodable file are distinct conditions: the
/// caller surfaces both as input errors but with different messages.
pub fn read_image(path: &Path) -> Result<DynamicImage, ModelError> {
    if !path.exists() {
        return Err(ModelError::ImageMissing(path.to_path_buf()));
    }
    image::open(path).map_err(|e| ModelError::ImageUnreadable(e.to_string()))
}

/// Resize to the model's input size and scale RGB to [0, 1], channels-last
pub fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let resized = image
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Triangle)
        .to_rgb8();

    let mut data = Vec::with_capacity((IMAGE_SIZE * IMAGE_SIZE * 3) as usize);
    for pixel in resized.pixels() {
        data.push(pixel[0] as f32 / 255.0);
        data.push(pixel[1] as f32 / 255.0);
        data.push(pixel[2] as f32 / 255.0);
    }

    Array4::from_shape_vec(
        (1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, 3),
        data,
    )
    .expect("pixel buffer matches declared shape")
}

/// Loaded brain model
#[derive(Debug)]
pub struct BrainModel {
    session: Mutex<Session>,
}

impl BrainModel {
    /// Load the ONNX artifact. Missing file is fatal for the MRI path.
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

        tracing::info!("Brain model loaded from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Classify one MRI image from its saved upload path
    pub fn predict(&self, image_path: &Path) -> Result<BrainPrediction, ModelError> {
        let image = read_image(image_path)?;
        let input_array = preprocess(&image);

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
        let logits = output_tensor.1;

        if logits.len() < BRAIN_CLASSES.len() {
            return Err(ModelError::Inference(format!(
                "expected {} class outputs, got {}",
                BRAIN_CLASSES.len(),
                logits.len()
            )));
        }

        Ok(classify(&logits[..BRAIN_CLASSES.len()]))
    }
}

/// Map class logits to the prediction outcome
fn classify(logits: &[f32]) -> BrainPrediction {
    let probs = softmax(logits);

    let (best_idx, best_prob) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .expect("class list is non-empty");

    let predicted_class = BRAIN_CLASSES[best_idx].to_string();
    let probabilities: BTreeMap<String, f32> = BRAIN_CLASSES
        .iter()
        .map(|c| c.to_string())
        .zip(probs.iter().copied())
        .collect();

    BrainPrediction {
        is_tumor: is_tumor_class(&predicted_class),
        predicted_class,
        probability: best_prob,
        probabilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 4.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Monotone: larger logit, larger probability
        assert!(probs[3] > probs[2] && probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0, 1000.0, 1000.0]);
        for p in &probs {
            assert!((p - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_classify_argmax() {
        let prediction = classify(&[0.1, 0.2, 5.0, 0.3]);
        assert_eq!(prediction.predicted_class, "no_tumor");
        assert!(!prediction.is_tumor);
        assert_eq!(prediction.probabilities.len(), BRAIN_CLASSES.len());
        assert!(prediction.probability > 0.9);
    }

    #[test]
    fn test_classify_tumor_class() {
        let prediction = classify(&[5.0, 0.1, 0.1, 0.1]);
        assert_eq!(prediction.predicted_class, "glioma");
        assert!(prediction.is_tumor);
    }

    #[test]
    fn test_is_tumor_class() {
        assert!(is_tumor_class("glioma"));
        assert!(is_tumor_class("meningioma"));
        assert!(is_tumor_class("pituitary"));
        assert!(!is_tumor_class("no_tumor"));
        assert!(!is_tumor_class("unknown"));
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let image = DynamicImage::new_rgb8(32, 48);
        let array = preprocess(&image);
        assert_eq!(
            array.shape(),
            &[1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, 3]
        );
        for value in array.iter() {
            assert!((0.0..=1.0).contains(value));
        }
    }

    #[test]
    fn test_read_image_missing_file() {
        let err = read_image(Path::new("/nonexistent/scan.png")).unwrap_err();
        assert!(matches!(err, ModelError::ImageMissing(_)));
    }

    #[test]
    fn test_read_image_unreadable_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not an image").unwrap();

        let err = read_image(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::ImageUnreadable(_)));
    }
}
