// Main entry point for the HR portal gateway server

use anyhow::{Context, Result};
use identity::{IdentityOptions, IdentityService};
use server_core::kernel::{IdentityAdapter, PgProfileStore, ServerDeps};
use server_core::server::build_app;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HR Portal gateway");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database (profile reads + health check)
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Identity provider client
    let identity_service = IdentityService::new(IdentityOptions {
        base_url: config.identity_base_url.clone(),
        anon_key: config.identity_anon_key.clone(),
    });

    let deps = ServerDeps::new(
        Arc::new(IdentityAdapter::new(identity_service)),
        Arc::new(PgProfileStore::new(pool.clone())),
        Some(pool),
    );

    // Build application
    let app = build_app(deps, config.allowed_origins.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
