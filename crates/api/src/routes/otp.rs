//! OTP issuance and verification routes

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::{extract::Payload, required_email, MessageResponse};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Generate a code for a provisioned email and mail it
pub async fn send_otp(
    State(state): State<AppState>,
    Payload(req): Payload<SendOtpRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = required_email(req.email)?;

    state.otp.request_otp(&email).await?;

    Ok(Json(MessageResponse {
        message: "OTP sent successfully".to_string(),
    }))
}

/// Verify a submitted code and issue a session token
pub async fn verify_otp(
    State(state): State<AppState>,
    Payload(req): Payload<VerifyOtpRequest>,
) -> ApiResult<Json<VerifyOtpResponse>> {
    let otp = req
        .otp
        .filter(|otp| !otp.is_empty())
        .ok_or_else(|| ApiError::Validation("Email and OTP are required".to_string()))?;

    // A missing email simply matches no user
    let email = otp_portal_shared::normalize_email(req.email.as_deref().unwrap_or_default());

    let token = state.otp.verify_otp(&email, &otp).await?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
        token,
    }))
}
