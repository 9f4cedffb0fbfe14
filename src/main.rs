use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use server_provisioning::db::{pool, seed, PgStore};
use server_provisioning::{api, AppState, Config};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Console plus a daily rolling file in `log_dir`. The guard must outlive the server.
fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log directory {}", config.log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "server-provisioning.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = init_tracing(&config)?;

    let pool = pool::connect(&config).await?;
    info!("✅ Connected to the database");

    let store = Arc::new(PgStore::new(pool.clone()));
    let state = AppState::new(store, config);

    if state.config.seed_demo_users {
        let created = seed::seed_demo_users(state.store.as_ref(), &state.credentials)
            .await
            .context("failed to seed demo users")?;
        info!("🌱 Seeded {} demo users", created);
    }

    let addr = state.config.bind_addr;
    let app = api::app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool))
        .await
        .context("server encountered an error")?;

    info!("✅ Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(pool: PgPool) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("⚠️ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }

    info!("🛠️ Closing database pool...");
    pool.close().await;
    info!("✅ Database pool closed.");
}
