//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod routes;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use gateway::application::{PURGE_INTERVAL, purge_expired, spawn_purge_task};
use gateway::{Collaborators, EmbeddedPrincipalStrategy, GatewayConfig, PgSessionStore, RouterTable, build_app};
use platform::rate_limit::MemoryRateLimitStore;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(environment = config.environment.as_str(), "Configuration loaded");

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let sessions = Arc::new(PgSessionStore::new(pool.clone()));
    let rate_limits = Arc::new(MemoryRateLimitStore::new());

    // Startup cleanup: failures are logged and do not prevent startup
    let report = purge_expired(sessions.as_ref(), rate_limits.as_ref()).await;
    tracing::info!(
        sessions_deleted = report.sessions_deleted,
        "Session cleanup completed"
    );
    spawn_purge_task(sessions.clone(), rate_limits.clone(), PURGE_INTERVAL);

    let routes = RouterTable::new()
        .root(routes::health_router(pool.clone()))
        .user(routes::user_router());

    let app = build_app(
        &config,
        routes,
        Collaborators {
            sessions,
            identity: Arc::new(EmbeddedPrincipalStrategy),
            rate_limits,
        },
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server running on PORT: {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
