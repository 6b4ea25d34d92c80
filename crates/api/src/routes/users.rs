//! Administrative user routes

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::OtpError,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::{extract::Payload, required_email, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

/// Remove a user row outright
pub async fn delete_user(
    State(state): State<AppState>,
    Payload(req): Payload<EmailRequest>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let email = required_email(req.email)?;

    state.otp.delete_user(&email).await.map_err(|e| match e {
        OtpError::EmailNotFound => ApiError::NotFound("User not found".to_string()),
        other => other.into(),
    })?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

/// Clear a user's OTP state. Succeeds whether or not anything was set.
pub async fn logout(
    State(state): State<AppState>,
    Payload(req): Payload<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = required_email(req.email)?;

    state.otp.logout(&email).await?;

    Ok(Json(MessageResponse {
        message: "User Logged Out Successfully. OTP Cleared.".to_string(),
    }))
}
