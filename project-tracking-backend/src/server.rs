use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use camino::Utf8PathBuf;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    db::{Store, cascade::Relationship},
};

mod api;

/// # Errors
pub async fn serve(config: Config, log_dir: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    initialize_logging(log_dir)?;

    let app_addr = config.app_address();
    let listener = TcpListener::bind(&app_addr)
        .await
        .context(format!("failed to listen on {app_addr}"))?;
    tracing::info!("project-tracking listening on {app_addr}");

    serve_on(listener, config).await
}

/// Serves the API on an already-bound listener until a shutdown signal
/// arrives.
/// # Errors
pub async fn serve_on(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    Relationship::check_acyclic().context("invalid cascade map")?;

    let store = match config.db_path() {
        Some(path) => Store::open(path).context(format!("failed to open store at {path}"))?,
        None => Store::in_memory().context("failed to open in-memory store")?,
    };
    tracing::info!(db_path = ?config.db_path(), "initialized store");

    let app_state = AppState {
        store,
        config: Arc::new(config),
    };

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("failed to serve app")
}

fn initialize_logging(log_dir: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    use tracing::Level;
    use tracing_subscriber::{filter::Targets, prelude::*, util::TryInitError};

    let log_layer = tracing_subscriber::fmt::layer();

    let result: Result<(), TryInitError> = match log_dir {
        None => {
            let dev_log_filter = Targets::new()
                .with_target("project_tracking_backend", Level::DEBUG)
                .with_target("tower_http", Level::TRACE);
            let log_layer = log_layer.pretty().with_filter(dev_log_filter);

            tracing_subscriber::registry().with(log_layer).try_init()
        }
        Some(path) => {
            let log_writer = tracing_appender::rolling::daily(path, "project-tracking.log");
            let prod_log_filter = Targets::new()
                .with_target("project_tracking_backend", Level::INFO)
                .with_target("tower_http", Level::INFO);
            let log_layer = log_layer
                .json()
                .with_writer(log_writer)
                .with_filter(prod_log_filter);

            tracing_subscriber::registry().with(log_layer).try_init()
        }
    };

    result.context("failed to initialize logging")
}

#[derive(Clone)]
struct AppState {
    store: Store,
    config: Arc<Config>,
}

fn app(app_state: AppState) -> Router {
    api::router()
        .layer(TraceLayer::new_for_http())
        .route("/health", get(async || ()))
        .with_state(app_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
