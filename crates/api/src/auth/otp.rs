//! One-time passcode lifecycle
//!
//! generate → store → (mail) → verify → consume, with expiry checked at
//! verification time and state cleared on logout or session expiry.

use std::sync::Arc;

use otp_portal_shared::{StoreError, UserStore};
use rand::Rng;
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};

use super::jwt::{JwtError, SessionTokenManager};
use crate::email::{MailError, Mailer, OtpEmailTemplate};

/// Smallest and largest codes; the range guarantees exactly six digits
pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Generate a uniformly random 6-digit code
pub fn generate_otp_code() -> String {
    rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX).to_string()
}

/// Why an OTP operation failed
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Email not found")]
    EmailNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("No OTP found. Request a new OTP.")]
    NoCodeIssued,
    #[error("OTP already verified. Please request a new OTP.")]
    AlreadyVerified,
    #[error("Invalid OTP")]
    InvalidCode,
    #[error("OTP expired. Request a new OTP.")]
    Expired,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Token(#[from] JwtError),
}

/// Issues, verifies and clears one-time passcodes
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    tokens: SessionTokenManager,
    template: OtpEmailTemplate,
    otp_ttl: Duration,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        tokens: SessionTokenManager,
        template: OtpEmailTemplate,
        otp_ttl_seconds: i64,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            template,
            otp_ttl: Duration::seconds(otp_ttl_seconds),
        }
    }

    /// Issue a fresh code for a provisioned email and mail it.
    ///
    /// Any outstanding code is overwritten. If the mail cannot be sent the
    /// new code is withdrawn again, unless a newer one has replaced it.
    pub async fn request_otp(&self, email: &str) -> Result<(), OtpError> {
        if self.store.find_by_email(email).await?.is_none() {
            tracing::info!(email = %email, "OTP requested for unknown email");
            return Err(OtpError::EmailNotFound);
        }

        let code = generate_otp_code();
        let expires = OffsetDateTime::now_utc() + self.otp_ttl;

        if !self.store.store_otp(email, &code, expires).await? {
            // Row deleted between lookup and update
            return Err(OtpError::EmailNotFound);
        }

        let message = self.template.render(email, &code, self.otp_ttl);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::error!(email = %email, error = %e, "Failed to send OTP email");
            if let Err(withdraw_err) = self.store.withdraw_otp(email, &code).await {
                tracing::error!(
                    email = %email,
                    error = %withdraw_err,
                    "Failed to withdraw undelivered OTP"
                );
            }
            return Err(e.into());
        }

        tracing::info!(email = %email, expires_at = %expires, "OTP issued");
        Ok(())
    }

    /// Check a submitted code and, on success, consume it and return a
    /// session token.
    ///
    /// Checks run in a fixed order and the first failure wins: row exists,
    /// a code was issued, it is not yet consumed, it matches, it is unexpired.
    pub async fn verify_otp(&self, email: &str, submitted: &str) -> Result<String, OtpError> {
        let record = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(OtpError::UserNotFound)?;

        let stored = record.otp.as_deref().ok_or(OtpError::NoCodeIssued)?;

        if record.otp_verified {
            return Err(OtpError::AlreadyVerified);
        }

        if !bool::from(stored.as_bytes().ct_eq(submitted.as_bytes())) {
            tracing::info!(email = %email, "Invalid OTP submitted");
            return Err(OtpError::InvalidCode);
        }

        if matches!(record.otp_expires, Some(expires) if OffsetDateTime::now_utc() >= expires) {
            tracing::info!(email = %email, "Expired OTP submitted");
            return Err(OtpError::Expired);
        }

        // Conditional on the code still being outstanding and unconsumed
        if !self.store.mark_verified(email, stored).await? {
            tracing::info!(email = %email, "OTP changed while being verified");
            return Err(self.classify_lost_consume(email, submitted).await?);
        }
        let token = self.tokens.sign(email)?;

        tracing::info!(email = %email, "OTP verified, session issued");
        Ok(token)
    }

    /// Re-read the row after a consume that matched nothing to report why
    async fn classify_lost_consume(
        &self,
        email: &str,
        submitted: &str,
    ) -> Result<OtpError, OtpError> {
        let Some(record) = self.store.find_by_email(email).await? else {
            return Ok(OtpError::UserNotFound);
        };

        Ok(match record.otp.as_deref() {
            None => OtpError::NoCodeIssued,
            Some(current) if current != submitted => OtpError::InvalidCode,
            Some(_) => OtpError::AlreadyVerified,
        })
    }

    /// Clear all OTP state for `email`. Unknown emails are not an error.
    pub async fn logout(&self, email: &str) -> Result<(), OtpError> {
        let cleared = self.store.clear_otp(email).await?;
        tracing::info!(email = %email, rows = cleared, "Logged out, OTP cleared");
        Ok(())
    }

    /// Remove a provisioned user outright
    pub async fn delete_user(&self, email: &str) -> Result<(), OtpError> {
        if !self.store.delete(email).await? {
            return Err(OtpError::EmailNotFound);
        }
        tracing::info!(email = %email, "User deleted");
        Ok(())
    }
}
