//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::{AppError, AppState};
use crate::handlers::auth::Claims;

/// User context extracted from JWT
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub username: String,
}

/// Optional user identity for endpoints that serve both authenticated and
/// anonymous callers. No Authorization header is a valid anonymous request;
/// a present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserContext>);

/// Middleware: Require user JWT authentication
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(req.headers())?;
    let user_ctx = decode_user_token(&token, &state.config.jwt_secret)?;

    // Insert into request extensions
    req.extensions_mut().insert(user_ctx);

    Ok(next.run(req).await)
}

/// Decode and validate a JWT into a user context
fn decode_user_token(token: &str, secret: &str) -> Result<UserContext, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    })?;

    let claims = token_data.claims;

    Ok(UserContext {
        user_id: Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?,
        username: claims.username,
    })
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }

    Ok(auth_header[7..].to_string())
}

// Implement FromRequestParts for UserContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

// MaybeUser decodes straight from the header so it works on routes outside
// the auth middleware
#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get(AUTHORIZATION).is_none() {
            return Ok(MaybeUser(None));
        }

        let token = extract_bearer_token(&parts.headers)?;
        let user_ctx = decode_user_token(&token, &state.config.jwt_secret)?;
        Ok(MaybeUser(Some(user_ctx)))
    }
}
