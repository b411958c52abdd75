//! POST /api/contact/discuss: forward a discussion request to the team.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use ragchat_types::mail::DiscussionRequest;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::state::AppState;

pub async fn discuss(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<DiscussionRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .mail_service
        .send_discussion(&body, &user)
        .await
        .map_err(|e| AppError::from(e).summarized("Failed to send discussion request"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Discussion request sent successfully",
    })))
}
