//! Common types used across the OTP portal

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// One row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRecord {
    pub email: String,
    /// Outstanding passcode, if one has been issued
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    /// Deadline for `otp`; set and cleared together with it
    pub otp_expires: Option<OffsetDateTime>,
    pub otp_verified: bool,
}

impl UserRecord {
    /// A freshly provisioned row with no OTP state
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            otp: None,
            otp_expires: None,
            otp_verified: false,
        }
    }

    /// True when the row carries no OTP or verification state
    pub fn is_cleared(&self) -> bool {
        self.otp.is_none() && self.otp_expires.is_none() && !self.otp_verified
    }
}

/// Canonical form of an email address used as the lookup key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
