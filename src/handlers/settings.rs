//! Settings handlers: profile, password change, history clear, account delete

use axum::{extract::State, Json};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::UserContext;
use crate::models::{PredictionLog, User, UserInfo};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    pub message: String,
    pub deleted: u64,
}

/// Profile info shown on the settings page
pub async fn profile(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<UserInfo>> {
    let user = User::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_info()))
}

/// Change the account password after verifying the old one
pub async fn change_password(
    State(state): State<AppState>,
    user_ctx: UserContext,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if req.old_password.is_empty() || req.new_password.is_empty() || req.confirm_password.is_empty() {
        return Err(AppError::ValidationError(
            "All password fields are required".to_string(),
        ));
    }

    if req.new_password != req.confirm_password {
        return Err(AppError::ValidationError(
            "New password and confirmation do not match".to_string(),
        ));
    }

    let user = User::find_by_id(&state.pool, user_ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Verify old password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(req.old_password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::ValidationError("Old password is incorrect".to_string()))?;

    // Hash and store the new one
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.new_password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    User::update_password(&state.pool, user.id, &password_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

/// Delete all of the user's prediction logs. Irreversible.
pub async fn clear_history(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<ClearHistoryResponse>> {
    let deleted = PredictionLog::clear_for_user(&state.pool, user.user_id).await?;

    tracing::info!("Cleared {} prediction logs for user {}", deleted, user.user_id);

    Ok(Json(ClearHistoryResponse {
        message: "Prediction history cleared".to_string(),
        deleted,
    }))
}

/// Delete the account. Prediction logs go with it via the schema cascade.
pub async fn delete_account(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<MessageResponse>> {
    User::delete(&state.pool, user.user_id).await?;

    tracing::info!("Account deleted: {}", user.user_id);

    Ok(Json(MessageResponse {
        message: "Your account has been deleted".to_string(),
    }))
}
