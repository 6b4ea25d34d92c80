//! Session gate middleware
//!
//! Guards protected routes with the bearer session token. An expired token is
//! treated as an implicit logout: the email it was issued to has its OTP
//! state cleared before the request is rejected.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use otp_portal_shared::UserStore;

use super::jwt::{JwtError, SessionClaims, SessionTokenManager};
use crate::error::ApiError;

/// State for the session gate
#[derive(Clone)]
pub struct SessionGate {
    pub tokens: SessionTokenManager,
    pub store: Arc<dyn UserStore>,
}

/// Identity attached to requests that passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub email: String,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            email: claims.email,
        }
    }
}

/// Outcome of checking one request's token
#[derive(Debug)]
pub enum SessionCheck {
    NoToken,
    Valid(SessionUser),
    Expired,
    Invalid,
}

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
}

impl SessionGate {
    /// Classify the request's token, running the expiry compensation when
    /// the token turns out to be expired
    pub async fn check(&self, headers: &HeaderMap) -> SessionCheck {
        let Some(token) = extract_bearer_token(headers) else {
            return SessionCheck::NoToken;
        };

        match self.tokens.verify(token) {
            Ok(claims) => SessionCheck::Valid(claims.into()),
            Err(JwtError::Expired) => {
                self.expire_session(token).await;
                SessionCheck::Expired
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                SessionCheck::Invalid
            }
        }
    }

    /// Best-effort cleanup for an expired token. Failures are logged only.
    async fn expire_session(&self, token: &str) {
        let email = match self.tokens.decode_unsafe(token) {
            Ok(claims) => claims.email,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read email from expired token");
                return;
            }
        };

        if email.is_empty() {
            return;
        }

        match self.store.clear_otp(&email).await {
            Ok(_) => tracing::info!(email = %email, "Logged out after session expiry"),
            Err(e) => tracing::error!(
                email = %email,
                error = %e,
                "Error clearing OTP after token expiry"
            ),
        }
    }
}

/// Middleware to require a valid session
///
/// Adds [`SessionUser`] to request extensions if the token is valid.
pub async fn require_session(
    State(gate): State<SessionGate>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    match gate.check(request.headers()).await {
        SessionCheck::Valid(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        SessionCheck::NoToken => Err(ApiError::MissingToken),
        SessionCheck::Invalid => Err(ApiError::InvalidToken),
        SessionCheck::Expired => Err(ApiError::SessionExpired),
    }
}
