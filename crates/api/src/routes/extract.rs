//! Request body extraction for the public routes
//!
//! Bodies may be JSON or form-encoded. An empty body reads as an empty
//! object so handlers report their own missing-field errors, and anything
//! unreadable is rejected in the API error shape.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Body extractor accepting JSON or `application/x-www-form-urlencoded`
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

fn invalid_body(err: impl std::fmt::Display) -> ApiError {
    tracing::debug!(error = %err, "Rejected request body");
    ApiError::Validation("Invalid request body".to_string())
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(invalid_body)?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(invalid_body)?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body).map(Self).map_err(invalid_body)
    }
}
