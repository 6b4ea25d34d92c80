//! Application configuration

use std::env;

use otp_portal_shared::normalize_email;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub banner: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub seed_emails: Vec<String>,

    // Authentication
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,

    // Email
    pub resend_api_key: String,
    pub resend_api_url: String,
    pub email_from: String,
    pub otp_template_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            banner: env::var("APP_BANNER").unwrap_or_else(|_| "OTP PORTAL BACKEND".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            seed_emails: parse_email_list(&env::var("SEED_EMAILS").unwrap_or_default()),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            session_ttl_seconds: positive(
                "SESSION_TTL_SECONDS",
                parse_or("SESSION_TTL_SECONDS", 60),
            )?,
            otp_ttl_seconds: positive("OTP_TTL_SECONDS", parse_or("OTP_TTL_SECONDS", 300))?,

            // Email
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "OTP Portal <noreply@localhost>".to_string()),
            otp_template_path: env::var("OTP_TEMPLATE_PATH").ok().filter(|p| !p.is_empty()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn positive(key: &'static str, value: i64) -> Result<i64, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::Invalid(key));
    }
    Ok(value)
}

/// Split a comma-separated allow-list, normalising and de-duplicating entries
pub fn parse_email_list(raw: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for email in raw.split(',').map(normalize_email) {
        if !email.is_empty() && !emails.contains(&email) {
            emails.push(email);
        }
    }
    emails
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    fn cleanup_config() {
        for key in [
            "DATABASE_URL",
            "JWT_SECRET",
            "SEED_EMAILS",
            "SESSION_TTL_SECONDS",
            "OTP_TTL_SECONDS",
            "OTP_TEMPLATE_PATH",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        cleanup_config();
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.session_ttl_seconds, 60);
        assert_eq!(config.otp_ttl_seconds, 300);
        assert_eq!(config.database_max_connections, 10);
        assert!(config.seed_emails.is_empty());
        assert!(config.otp_template_path.is_none());

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_missing_and_weak_secret() {
        cleanup_config();
        env::set_var("DATABASE_URL", "postgres://test");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        env::set_var("JWT_SECRET", "too-short");
        assert!(matches!(Config::from_env(), Err(ConfigError::WeakSecret(_))));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        cleanup_config();
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_ttl_must_be_positive() {
        cleanup_config();
        setup_minimal_config();
        env::set_var("SESSION_TTL_SECONDS", "0");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("SESSION_TTL_SECONDS"))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_seed_emails_from_env() {
        cleanup_config();
        setup_minimal_config();
        env::set_var("SEED_EMAILS", "a@x.com, B@X.com,,a@x.com");

        let config = Config::from_env().unwrap();
        assert_eq!(config.seed_emails, vec!["a@x.com", "b@x.com"]);

        cleanup_config();
    }
}
