//! OTP Portal API Library
//!
//! Email one-time-passcode login with a short-lived session token guarding
//! a protected resource.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod testing;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
