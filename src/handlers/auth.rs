//! Authentication handlers

use axum::{extract::State, Json};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::UserContext;
use crate::models::{LoginRequest, LoginResponse, User, UserInfo};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // User ID
    pub username: String, // Display name
    pub exp: usize,       // Expiration timestamp
    pub iat: usize,       // Issued at
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if req.password != req.confirm_password {
        return Err(AppError::ValidationError(
            "Passwords do not match".to_string(),
        ));
    }

    // Uniqueness on both username and email
    if User::find_by_username(&state.pool, &req.username).await?.is_some() {
        return Err(AppError::AlreadyExists("Username is already taken".to_string()));
    }
    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::AlreadyExists("Email is already registered".to_string()));
    }

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    let user = User::create(&state.pool, &req.username, &req.email, &password_hash).await?;

    tracing::info!("New user registered: {} ({})", user.username, user.id);

    Ok(Json(RegisterResponse {
        user_id: user.id,
        username: user.username,
        email: user.email,
    }))
}

/// Login endpoint. The identifier matches either username or email.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = User::find_by_identifier(&state.pool, &req.identifier)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    if !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    // Generate JWT
    let token = generate_jwt(&user, &state.config.jwt_secret, state.config.jwt_expiration_hours)?;

    Ok(Json(LoginResponse {
        token,
        user: user.to_info(),
    }))
}

/// Current user info
pub async fn me(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<UserInfo>> {
    let user = User::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_info()))
}

/// Generate JWT token
fn generate_jwt(user: &User, secret: &str, expiration_hours: u64) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.to_string()))
}
