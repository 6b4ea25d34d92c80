//! In-memory doubles for the store and mail transport

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use otp_portal_shared::{StoreError, StoreResult, UserRecord, UserStore};
use time::OffsetDateTime;

use crate::config::Config;
use crate::email::{MailError, Mailer, OtpEmailTemplate, OutgoingEmail};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-must-be-at-least-32-characters-long";

// =============================================================================
// Memory User Store
// =============================================================================

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<HashMap<String, UserRecord>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryUserStore {
    pub fn with_emails(emails: &[&str]) -> Self {
        let store = Self::default();
        for email in emails {
            store.put(UserRecord::new(*email));
        }
        store
    }

    pub fn get(&self, email: &str) -> Option<UserRecord> {
        self.rows.lock().unwrap().get(email).cloned()
    }

    /// Insert or replace a row directly, bypassing write counting
    pub fn put(&self, record: UserRecord) {
        self.rows
            .lock()
            .unwrap()
            .insert(record.email.clone(), record);
    }

    /// Number of mutating calls that reached the store
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the database were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<String, UserRecord>) -> T) -> StoreResult<T> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(f(&mut self.rows.lock().unwrap()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.check()?;
        Ok(self.get(email))
    }

    async fn store_otp(
        &self,
        email: &str,
        otp: &str,
        expires: OffsetDateTime,
    ) -> StoreResult<bool> {
        self.write(|rows| match rows.get_mut(email) {
            Some(row) => {
                row.otp = Some(otp.to_string());
                row.otp_expires = Some(expires);
                row.otp_verified = false;
                true
            }
            None => false,
        })
    }

    async fn mark_verified(&self, email: &str, otp: &str) -> StoreResult<bool> {
        self.write(|rows| match rows.get_mut(email) {
            Some(row) if row.otp.as_deref() == Some(otp) && !row.otp_verified => {
                row.otp_verified = true;
                true
            }
            _ => false,
        })
    }

    async fn clear_otp(&self, email: &str) -> StoreResult<u64> {
        self.write(|rows| match rows.get_mut(email) {
            Some(row) => {
                row.otp = None;
                row.otp_expires = None;
                row.otp_verified = false;
                1
            }
            None => 0,
        })
    }

    async fn withdraw_otp(&self, email: &str, otp: &str) -> StoreResult<bool> {
        self.write(|rows| match rows.get_mut(email) {
            Some(row) if row.otp.as_deref() == Some(otp) => {
                row.otp = None;
                row.otp_expires = None;
                true
            }
            _ => false,
        })
    }

    async fn delete(&self, email: &str) -> StoreResult<bool> {
        self.write(|rows| rows.remove(email).is_some())
    }

    async fn seed(&self, emails: &[String]) -> StoreResult<u64> {
        self.write(|rows| {
            let mut inserted = 0;
            for email in emails {
                if !rows.contains_key(email) {
                    rows.insert(email.clone(), UserRecord::new(email.clone()));
                    inserted += 1;
                }
            }
            inserted
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

// =============================================================================
// Recording Mailer
// =============================================================================

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages delivered so far
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Reject the next message
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                body: "provider unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn test_template() -> OtpEmailTemplate {
    OtpEmailTemplate::new("<p>Hi {{email}}, your code is {{OTP}}</p>")
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        banner: "OTP PORTAL BACKEND".to_string(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        seed_emails: Vec::new(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        session_ttl_seconds: 60,
        otp_ttl_seconds: 300,
        resend_api_key: String::new(),
        resend_api_url: "http://127.0.0.1:9".to_string(),
        email_from: "OTP Portal <noreply@localhost>".to_string(),
        otp_template_path: None,
    }
}

/// Application state wired to in-memory doubles
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new(emails: &[&str]) -> Self {
        let store = Arc::new(MemoryUserStore::with_emails(emails));
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(test_config(), store.clone(), mailer.clone(), test_template());
        Self {
            state,
            store,
            mailer,
        }
    }
}
