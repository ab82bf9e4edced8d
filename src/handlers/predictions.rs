//! Prediction handlers
//!
//! The prediction pipeline: normalize input → run the model → interpret the
//! result → append to the prediction log. Both endpoints serve anonymous
//! callers too; without a user id the log step is skipped and `log_id`
//! comes back null.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::{MaybeUser, UserContext};
use crate::ml::features::FeatureVector;
use crate::ml::interpret;
use crate::models::{HistoryFilter, ModelType, PredictionLog};

/// Allowed MRI image extensions
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Serialize)]
pub struct HeartPredictionResponse {
    pub risk_label: String,
    pub probability: f32,
    pub features: BTreeMap<&'static str, f32>,
    pub input_summary: String,
    pub suggestion: String,
    pub log_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BrainPredictionResponse {
    pub predicted_class: String,
    pub probability: f32,
    pub probabilities: BTreeMap<String, f32>,
    pub is_tumor: bool,
    pub input_summary: String,
    pub suggestion: String,
    pub log_id: Option<i64>,
}

/// Heart-disease prediction from a map of raw form fields
pub async fn heart(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(form): Json<HashMap<String, String>>,
) -> AppResult<Json<HeartPredictionResponse>> {
    let features = FeatureVector::from_form(&form);
    let input_summary = features.input_summary();

    let prediction = state.models.heart()?.predict(&features)?;

    // No user session means the prediction is served but not logged
    let log_id = match &user {
        Some(user) => Some(
            PredictionLog::append(
                &state.pool,
                user.user_id,
                ModelType::HeartDisease,
                &input_summary,
                prediction.risk_label.as_str(),
                prediction.probability,
            )
            .await?,
        ),
        None => None,
    };

    Ok(Json(HeartPredictionResponse {
        risk_label: prediction.risk_label.as_str().to_string(),
        probability: prediction.probability,
        features: features.named_values().into_iter().collect(),
        input_summary,
        suggestion: interpret::heart_suggestion(prediction.risk_label).to_string(),
        log_id,
    }))
}

/// Brain-tumor prediction from an uploaded MRI image
pub async fn brain(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    mut multipart: Multipart,
) -> AppResult<Json<BrainPredictionResponse>> {
    // Pull the mri_image part out of the upload
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?
    {
        if field.name() == Some("mri_image") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Invalid upload: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let Some((filename, bytes)) = upload else {
        return Err(AppError::ValidationError(
            "Please select an MRI image to upload".to_string(),
        ));
    };

    if filename.is_empty() || bytes.is_empty() {
        return Err(AppError::ValidationError(
            "Please select an MRI image to upload".to_string(),
        ));
    }

    let sanitized = sanitize_filename(&filename);
    if !has_allowed_extension(&sanitized) {
        return Err(AppError::ValidationError(
            "Unsupported file type. Please upload a PNG, JPG, JPEG, or BMP image".to_string(),
        ));
    }

    // Save under a unique name so concurrent uploads never collide
    let save_name = format!("{}_{}", Uuid::new_v4(), sanitized);
    let save_path = state.config.upload_dir.join(&save_name);

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("create upload dir: {}", e)))?;
    tokio::fs::write(&save_path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("save upload: {}", e)))?;

    // Digest of the input, not the input itself, goes into the log
    let digest = format!("{:x}", Sha256::digest(&bytes));
    let input_summary = format!("file={}, sha256={}", sanitized, &digest[..16]);

    let prediction = state.models.brain()?.predict(&save_path)?;

    let log_id = match &user {
        Some(user) => Some(
            PredictionLog::append(
                &state.pool,
                user.user_id,
                ModelType::BrainTumorMulticlass,
                &input_summary,
                &prediction.predicted_class,
                prediction.probability,
            )
            .await?,
        ),
        None => None,
    };

    let suggestion = interpret::brain_suggestion(&prediction.predicted_class, prediction.probability);

    Ok(Json(BrainPredictionResponse {
        predicted_class: prediction.predicted_class,
        probability: prediction.probability,
        probabilities: prediction.probabilities,
        is_tumor: prediction.is_tumor,
        input_summary,
        suggestion,
        log_id,
    }))
}

/// Own prediction history, newest first
pub async fn history(
    State(state): State<AppState>,
    user: UserContext,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<Vec<PredictionLog>>> {
    let logs = PredictionLog::list_for_user(&state.pool, user.user_id, filter).await?;
    Ok(Json(logs))
}

/// Strip path components and anything outside [A-Za-z0-9._-]
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\scans\\brain.png"), "brain.png");
        assert_eq!(sanitize_filename("scan.png"), "scan.png");
    }

    #[test]
    fn test_sanitize_filename_drops_special_chars() {
        assert_eq!(sanitize_filename("my scan (1).png"), "myscan1.png");
        assert_eq!(sanitize_filename("sc@n!.jpg"), "scn.jpg");
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(has_allowed_extension("scan.png"));
        assert!(has_allowed_extension("scan.JPG"));
        assert!(has_allowed_extension("scan.jpeg"));
        assert!(has_allowed_extension("scan.bmp"));
        assert!(!has_allowed_extension("scan.gif"));
        assert!(!has_allowed_extension("scan.dcm"));
        assert!(!has_allowed_extension("scan"));
    }
}
