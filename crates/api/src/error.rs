//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use otp_portal_shared::StoreError;
use serde_json::json;

use crate::auth::OtpError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Session errors
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    // OTP errors
    #[error("User not found")]
    UserNotFound,
    #[error("No OTP found. Request a new OTP.")]
    NoOtpIssued,
    #[error("OTP already verified. Please request a new OTP.")]
    OtpAlreadyVerified,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("OTP expired. Request a new OTP.")]
    OtpExpired,

    // Validation errors
    #[error("{0}")]
    Validation(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Email delivery failed: {0}")]
    Email(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            // Session
            ApiError::MissingToken => (StatusCode::UNAUTHORIZED, "NO_TOKEN"),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            ApiError::SessionExpired => (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),

            // OTP
            ApiError::UserNotFound => (StatusCode::BAD_REQUEST, "USER_NOT_FOUND"),
            ApiError::NoOtpIssued => (StatusCode::BAD_REQUEST, "NO_OTP"),
            ApiError::OtpAlreadyVerified => (StatusCode::BAD_REQUEST, "OTP_ALREADY_VERIFIED"),
            ApiError::InvalidOtp => (StatusCode::BAD_REQUEST, "INVALID_OTP"),
            ApiError::OtpExpired => (StatusCode::BAD_REQUEST, "OTP_EXPIRED"),

            // Validation
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),

            // Resources
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),

            // Internal
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Email(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EMAIL_ERROR"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Internal details stay in the logs
        let message = match &self {
            ApiError::Database(_) => "Database error".to_string(),
            ApiError::Email(_) => "Failed to send OTP email".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "message": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::Database(err.to_string())
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::EmailNotFound => ApiError::NotFound("Email not found".to_string()),
            OtpError::UserNotFound => ApiError::UserNotFound,
            OtpError::NoCodeIssued => ApiError::NoOtpIssued,
            OtpError::AlreadyVerified => ApiError::OtpAlreadyVerified,
            OtpError::InvalidCode => ApiError::InvalidOtp,
            OtpError::Expired => ApiError::OtpExpired,
            OtpError::Store(e) => e.into(),
            OtpError::Mail(e) => ApiError::Email(e.to_string()),
            OtpError::Token(e) => {
                tracing::error!(error = %e, "Failed to sign session token");
                ApiError::Internal
            }
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
