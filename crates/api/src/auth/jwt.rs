//! Session token generation and validation
//!
//! Two levels of trust are exposed: [`SessionTokenManager::verify`] checks the
//! signature and expiry and is the only call allowed to authorize a request;
//! [`SessionTokenManager::decode_unsafe`] only reads the payload and is used to
//! clean up after an expired session.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Email the session was issued to
    pub email: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Signs and checks session tokens
#[derive(Clone)]
pub struct SessionTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokenManager {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Sign a session token for `email`, valid from now
    pub fn sign(&self, email: &str) -> Result<String, JwtError> {
        self.sign_at(email, OffsetDateTime::now_utc())
    }

    /// Sign a session token as if it had been issued at `issued_at`
    pub fn sign_at(&self, email: &str, issued_at: OffsetDateTime) -> Result<String, JwtError> {
        let claims = SessionClaims {
            email: email.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.ttl).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Fully verify a token: signature, algorithm and expiry
    pub fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The lifetime is short, so it is enforced to the second.
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }

    /// Read the claims without checking signature or expiry.
    ///
    /// Never use the result to authorize anything.
    pub fn decode_unsafe(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::Malformed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
