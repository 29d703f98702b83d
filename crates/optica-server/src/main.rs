mod api;
mod middleware;

use std::sync::Arc;

use optica_catalog::{CatalogSettings, LensCatalog, PgAuditSink, PgProductStore};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = optica_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pool_config = optica_db::PoolConfig::from_app_config(&config);
    let pool = optica_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = optica_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let catalog = LensCatalog::new(
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::new(PgAuditSink::new(pool)),
        CatalogSettings::from_app_config(&config),
    );
    let auth = AuthState::from_config(&config)?;
    let app = build_app(
        AppState { catalog },
        auth,
        RateLimitState::from_config(&config),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "optica-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
