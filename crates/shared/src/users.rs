//! User record storage
//!
//! Every operation touches at most one row, so the store's own row-level
//! consistency is the only concurrency guard. Handlers receive the store as
//! an injected `Arc<dyn UserStore>`.

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::StoreResult;
use crate::types::UserRecord;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the row for `email`, if it exists
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Store a freshly issued code, overwriting any outstanding one and
    /// resetting the verified flag. Returns false when no row matched.
    async fn store_otp(&self, email: &str, otp: &str, expires: OffsetDateTime)
        -> StoreResult<bool>;

    /// Consume `otp` if it is still the outstanding, unconsumed code.
    /// Returns false when a newer code replaced it or it was already used.
    async fn mark_verified(&self, email: &str, otp: &str) -> StoreResult<bool>;

    /// Clear the code, its expiry and the verified flag. Returns the number
    /// of rows touched (0 for an unknown email).
    async fn clear_otp(&self, email: &str) -> StoreResult<u64>;

    /// Clear the code only if it is still `otp`, leaving a newer code alone
    async fn withdraw_otp(&self, email: &str, otp: &str) -> StoreResult<bool>;

    /// Delete the row. Returns false when no row matched.
    async fn delete(&self, email: &str) -> StoreResult<bool>;

    /// Insert any missing emails from the allow-list. Returns rows inserted.
    async fn seed(&self, emails: &[String]) -> StoreResult<u64>;

    /// Connectivity check for health probes
    async fn ping(&self) -> StoreResult<()>;
}

/// Postgres-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT email, otp, otp_expires, otp_verified FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn store_otp(
        &self,
        email: &str,
        otp: &str,
        expires: OffsetDateTime,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp = $2, otp_expires = $3, otp_verified = FALSE
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(otp)
        .bind(expires)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_verified(&self, email: &str, otp: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp_verified = TRUE
            WHERE email = $1 AND otp = $2 AND otp_verified = FALSE
            "#,
        )
        .bind(email)
        .bind(otp)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_otp(&self, email: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp = NULL, otp_expires = NULL, otp_verified = FALSE
            WHERE email = $1
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn withdraw_otp(&self, email: &str, otp: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp = NULL, otp_expires = NULL
            WHERE email = $1 AND otp = $2
            "#,
        )
        .bind(email)
        .bind(otp)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, email: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn seed(&self, emails: &[String]) -> StoreResult<u64> {
        if emails.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (email)
            SELECT UNNEST($1::text[])
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(emails)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            requested = emails.len(),
            inserted = result.rows_affected(),
            "Seeded allow-listed users"
        );

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
