//! Web Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::net::SocketAddr;
use std::time::Duration;

use auth::domain::repository::{SessionStore, UserRepository};
use auth::{AuthAppState, MemorySessionStore, MemoryUserRepository, PgSessionStore, PgUserRepository};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web::WebConfig;
use web::snippets::{MemorySnippetRepository, PgSnippetRepository, SnippetRepository};

/// Interval between expired-session sweeps
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WebConfig::from_env()?;

    match config.database_url.clone() {
        Some(database_url) => {
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

            serve(
                config,
                PgUserRepository::new(pool.clone()),
                PgSessionStore::new(pool.clone()),
                PgSnippetRepository::new(pool),
            )
            .await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            serve(
                config,
                MemoryUserRepository::new(),
                MemorySessionStore::new(),
                MemorySnippetRepository::new(),
            )
            .await
        }
    }
}

async fn serve<U, S, R>(config: WebConfig, users: U, sessions: S, snippets: R) -> anyhow::Result<()>
where
    U: UserRepository + Clone + Send + Sync + 'static,
    S: SessionStore + Clone + Send + Sync + 'static,
    R: SnippetRepository + Clone + Send + Sync + 'static,
{
    let auth_state = AuthAppState::new(users, sessions, config.auth)?;

    // Startup cleanup: errors here should not prevent server startup
    if let Err(e) = auth_state.sessions.sweep().await {
        tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
    }

    let sweeper = auth_state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = sweeper.sweep().await {
                tracing::warn!(error = %e, "Session cleanup failed");
            }
        }
    });

    let app = web::build_app(snippets, auth_state);

    tracing::info!("Listening on {}", config.addr);

    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
