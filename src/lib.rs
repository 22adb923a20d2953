pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::path::Path;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Raffler v{} starting...", env!("CARGO_PKG_VERSION"));

    let legacy_path = config.general.legacy_data_path.clone();
    let port = config.server.port;

    let state = api::create_app_state_from_config(config).await?;

    if let Err(e) =
        services::backup::migrate_legacy(&state.shared.store, Path::new(&legacy_path)).await
    {
        // Startup continues; the file stays in place for a retry after the
        // operator fixes it.
        error!("Legacy data migration failed: {e:#}");
    }

    let app = api::router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }
}
