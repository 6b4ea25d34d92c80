//! OTP portal API server entry point

use std::sync::Arc;

use anyhow::Context;
use otp_portal_api::{
    email::{EmailConfig, OtpEmailTemplate, ResendMailer},
    routes::create_router,
    AppState, Config,
};
use otp_portal_shared::{create_pool, run_migrations, PgUserStore, UserStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgUserStore::new(pool));
    if let Err(e) = store.seed(&config.seed_emails).await {
        tracing::error!(error = %e, "Error inserting allow-listed email addresses");
    }

    let email_config = EmailConfig::from_config(&config);
    if !email_config.is_enabled() {
        tracing::warn!("RESEND_API_KEY not set; OTP emails cannot be delivered");
    }
    let mailer = Arc::new(ResendMailer::new(email_config));
    let template = OtpEmailTemplate::load(&config).context("Failed to load OTP email template")?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, store, mailer, template);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server is running on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "otp_portal_api=info,otp_portal_shared=info,tower_http=info".into());

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
