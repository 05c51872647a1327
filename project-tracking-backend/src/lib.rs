use camino::Utf8PathBuf;
use config::Config;
use tokio::net::TcpListener;

pub mod config;
pub mod db;

mod server;

/// # Errors
pub async fn serve_dev_app(host: String, port: u16) -> anyhow::Result<()> {
    server::serve(Config::dev(host, port), None).await
}

/// # Errors
pub async fn serve_prod_app(config: Config, log_dir: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    server::serve(config, log_dir).await
}

/// Serves the API on `listener` without installing a log subscriber.
/// # Errors
pub async fn serve_on(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    server::serve_on(listener, config).await
}
