//! Outbound email for OTP delivery
//!
//! Sends transactional emails via the Resend API. The lifecycle only sees the
//! [`Mailer`] trait, so delivery can be swapped out in tests.

use async_trait::async_trait;
use time::Duration;

use crate::config::Config;

/// Bundled OTP email body, used unless `OTP_TEMPLATE_PATH` overrides it
const DEFAULT_OTP_TEMPLATE: &str = include_str!("../templates/otp_template.html");

pub const OTP_SUBJECT: &str = "OTP for Login";

/// A fully rendered message ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email delivery is not configured")]
    NotConfigured,
    #[error("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The single "send message" operation of a mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,
    /// Resend API base URL
    pub resend_api_url: String,
    /// From address for emails
    pub email_from: String,
}

impl EmailConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resend_api_key: config.resend_api_key.clone(),
            resend_api_url: config.resend_api_url.trim_end_matches('/').to_string(),
            email_from: config.email_from.clone(),
        }
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}

/// Resend-backed mail transport
#[derive(Clone)]
pub struct ResendMailer {
    config: EmailConfig,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if !self.config.is_enabled() {
            tracing::warn!(subject = %email.subject, "Email not configured, cannot send");
            return Err(MailError::NotConfigured);
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [email.to],
            "subject": email.subject,
            "text": email.text,
            "html": email.html,
        });

        let response = self
            .client
            .post(format!("{}/emails", self.config.resend_api_url))
            .bearer_auth(&self.config.resend_api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Email provider rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// HTML template for OTP emails with `{{OTP}}`, `{{email}}` and
/// `{{validity}}` placeholders
#[derive(Debug, Clone)]
pub struct OtpEmailTemplate {
    html: String,
}

impl OtpEmailTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Load the template named by the config, or the bundled one
    pub fn load(config: &Config) -> std::io::Result<Self> {
        match &config.otp_template_path {
            Some(path) => {
                let html = std::fs::read_to_string(path)?;
                tracing::info!(path = %path, "Loaded OTP email template");
                Ok(Self::new(html))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn render(&self, to: &str, code: &str, validity: Duration) -> OutgoingEmail {
        let validity = describe_validity(validity);
        let html = self
            .html
            .replace("{{OTP}}", code)
            .replace("{{email}}", to)
            .replace("{{validity}}", &validity);

        OutgoingEmail {
            to: to.to_string(),
            subject: OTP_SUBJECT.to_string(),
            text: format!("Your OTP for login is {code}. It will expire in {validity}."),
            html,
        }
    }
}

impl Default for OtpEmailTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_TEMPLATE)
    }
}

fn describe_validity(validity: Duration) -> String {
    let seconds = validity.whole_seconds();
    match (seconds / 60, seconds % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) => format!("{minutes} minutes"),
        _ => format!("{seconds} seconds"),
    }
}
