//! Authentication: one-time passcodes and session tokens

pub mod jwt;
pub mod middleware;
pub mod otp;

pub use jwt::{JwtError, SessionClaims, SessionTokenManager};
pub use middleware::{require_session, SessionCheck, SessionGate, SessionUser};
pub use otp::{generate_otp_code, OtpError, OtpService};
