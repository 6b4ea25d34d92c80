//! Database utilities and connection management

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::{str::FromStr, time::Duration};

use crate::error::StoreResult;

/// Create a database connection pool
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?;

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(300))
        .connect_with(options)
        .await
}

/// Run database migrations
///
/// Migrations are idempotent, so this runs on every startup.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
