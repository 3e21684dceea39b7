//! Character Gold Server - Main Application Entry Point
//!
//! A REST API server for managing tabletop-game characters and moving gold
//! between them.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router
//! 5. Start server on configured port

use std::sync::Arc;

use character_gold_server::{
    config::Config,
    db,
    models::character::CharacterDefaults,
    routes::{self, AppState},
    store::PgStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(
        &config.database_url,
        config.database_max_connections,
        config.lock_timeout(),
    )
    .await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        lock_timeout_ms = config.lock_timeout_ms,
        "Database pool created"
    );

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let defaults = CharacterDefaults {
        race: config.default_race.clone(),
        class: config.default_class.clone(),
    };
    let store = PgStore::new(pool, defaults);
    let app = routes::router(AppState::new(Arc::new(store)));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
