//! OTP Portal Shared Types and Storage
//!
//! This crate contains the user record type, storage errors and the
//! `UserStore` abstraction shared by the API server.

pub mod db;
pub mod error;
pub mod types;
pub mod users;

pub use db::*;
pub use error::*;
pub use types::*;
pub use users::{PgUserStore, UserStore};
