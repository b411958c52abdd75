//! Bearer token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>` and resolves it to an account
//! through the auth service. Tokens are SHA-256 hashed before lookup.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use ragchat_types::user::PublicUser;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated account. Extracting this validates the bearer token.
pub struct AuthUser(pub PublicUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let user = state.auth_service.authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

fn extract_bearer(parts: &Parts) -> Result<String, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Err(AppError::Unauthorized(
            "Not authorized, no token".to_string(),
        ));
    };
    let value = header.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Expected 'Authorization: Bearer <token>'".to_string())
        })
}
