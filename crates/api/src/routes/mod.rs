//! API routes

pub mod extract;
pub mod health;
pub mod otp;
pub mod protected;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::require_session,
    error::{ApiError, ApiResult},
    security::security_headers_middleware,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Normalise a required email field, rejecting missing or blank values
pub(crate) fn required_email(email: Option<String>) -> ApiResult<String> {
    email
        .map(|e| otp_portal_shared::normalize_email(&e))
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let gate = state.session_gate();

    // Health check routes for infrastructure monitoring
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(protected::banner))
        .route("/send-otp", post(otp::send_otp))
        .route("/verify-otp", post(otp::verify_otp))
        .route("/delete-user", delete(users::delete_user))
        .route("/logout", post(users::logout));

    // Session-gated routes
    let protected_routes = Router::new()
        .route("/protected", get(protected::protected))
        .layer(middleware::from_fn_with_state(gate, require_session));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}
