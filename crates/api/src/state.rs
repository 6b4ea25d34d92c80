//! Shared application state

use std::sync::Arc;

use otp_portal_shared::UserStore;

use crate::{
    auth::{OtpService, SessionGate, SessionTokenManager},
    config::Config,
    email::{Mailer, OtpEmailTemplate},
};

/// State handed to every handler and middleware.
///
/// The store and mail transport are injected here once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn UserStore>,
    pub tokens: SessionTokenManager,
    pub otp: OtpService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        template: OtpEmailTemplate,
    ) -> Self {
        let tokens = SessionTokenManager::new(&config.jwt_secret, config.session_ttl_seconds);
        let otp = OtpService::new(
            store.clone(),
            mailer,
            tokens.clone(),
            template,
            config.otp_ttl_seconds,
        );

        Self {
            config: Arc::new(config),
            store,
            tokens,
            otp,
        }
    }

    /// State needed by the session gate middleware
    pub fn session_gate(&self) -> SessionGate {
        SessionGate {
            tokens: self.tokens.clone(),
            store: self.store.clone(),
        }
    }
}
