//! Report download handlers
//!
//! Both endpoints fetch the log ownership-scoped: a log id belonging to a
//! different user 404s exactly like a missing one.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::UserContext;
use crate::models::{ModelType, PredictionLog, User};
use crate::report;

/// Download a PDF report for a heart-disease prediction
pub async fn heart(
    State(state): State<AppState>,
    user: UserContext,
    Path(log_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    render_report(state, user, log_id, ModelType::HeartDisease).await
}

/// Download a PDF report for a brain-tumor prediction
pub async fn brain(
    State(state): State<AppState>,
    user: UserContext,
    Path(log_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    render_report(state, user, log_id, ModelType::BrainTumorMulticlass).await
}

async fn render_report(
    state: AppState,
    user: UserContext,
    log_id: i64,
    model_type: ModelType,
) -> AppResult<impl IntoResponse> {
    let log = PredictionLog::find_for_user(&state.pool, log_id, user.user_id, Some(model_type))
        .await?
        .ok_or_else(|| AppError::NotFound("Prediction log not found".to_string()))?;

    let user = User::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (pdf, prefix) = match model_type {
        ModelType::HeartDisease => (report::generate_heart_report(&user, &log), "heart"),
        ModelType::BrainTumorMulticlass => (report::generate_brain_report(&user, &log), "brain"),
    };
    let pdf = pdf.map_err(|e| AppError::InternalError(e.to_string()))?;

    let filename = format!("{}_report_{}.pdf", prefix, log.id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pdf,
    ))
}
