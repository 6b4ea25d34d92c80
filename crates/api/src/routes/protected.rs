//! Session-protected resource and the root banner

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use crate::{auth::SessionUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: String,
}

/// Only reachable through the session gate, which supplies the identity
pub async fn protected(Extension(user): Extension<SessionUser>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Protected data accessed".to_string(),
        user: user.email,
    })
}

/// Plain-text banner at `/`
pub async fn banner(State(state): State<AppState>) -> String {
    state.config.banner.clone()
}
