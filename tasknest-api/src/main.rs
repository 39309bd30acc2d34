//! # TaskNest API Server
//!
//! REST backend for per-user task lists.
//!
//! ## Architecture
//!
//! - Axum router with bearer-token authentication
//! - PostgreSQL through sqlx, or an in-memory store when `DATABASE_URL` is unset
//! - SendGrid for account mail, or log-only delivery without an API key
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p tasknest-api
//! ```

use std::sync::Arc;

use tasknest_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasknest_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    notify::{sendgrid::SendGridNotifier, LogNotifier, Notifier},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "TaskNest API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let (store, pool) = match &config.database.url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: config.database.max_connections,
                ..Default::default()
            })
            .await?;
            run_migrations(&pool).await?;

            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.mail.sendgrid_api_key {
        Some(key) => Arc::new(SendGridNotifier::new(key.clone(), config.mail.from.clone())?),
        None => {
            tracing::warn!("SENDGRID_API_KEY not set, account mail will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, notifier, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "tasknest_api=debug,tasknest_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
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
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
