//! Server entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the configured store.
//! - Serve the HTTP API until Ctrl+C or SIGTERM.

mod config;

use anyhow::{Context, Result};
use config::{AppConfig, StoreBackend};
use log::{error, info};
use roster_api::{build_router, AppState};
use roster_core::{
    core_version, init_logging, InMemoryPersonStore, LogOptions, PersonService, PersonStore,
    SqlitePersonStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load application configuration")?;

    init_logging(&LogOptions::new(&config.log_level, &config.log_dir).echo_stderr(true))
        .context("failed to initialize logging")?;

    let store: Arc<dyn PersonStore> = match config.store {
        StoreBackend::Sqlite => Arc::new(
            SqlitePersonStore::open(&config.db_path)
                .with_context(|| format!("failed to open {}", config.db_path.display()))?,
        ),
        StoreBackend::Memory => Arc::new(InMemoryPersonStore::new()),
    };

    let service = PersonService::new(store, config.age_policy());
    info!(
        "event=store_ready module=cli status=ok backend={} min_age={}",
        config.store.label(),
        service.policy().min_age()
    );

    let app = build_router(AppState::new(service));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        "event=server_start module=cli status=ok address={addr} version={}",
        core_version()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("event=server_stop module=cli status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=signal_install module=cli status=error signal=ctrl_c error={err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("event=signal_install module=cli status=error signal=sigterm error={err}");
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
}
