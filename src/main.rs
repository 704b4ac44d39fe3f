use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crypto_reports_hub::config::HubConfig;
use crypto_reports_hub::state::AppState;

#[tokio::main]
async fn main() {
    // Initialise tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = HubConfig::from_env();
    let bind = cfg.bind.clone();
    let port = cfg.port;

    if cfg.credentials_path.is_none() {
        tracing::warn!("CRYPTO_REPORTS_CREDENTIALS not set; login gate is disabled");
    }

    let state = AppState::new(cfg).expect("failed to initialise application state");

    let app = crypto_reports_hub::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .expect("invalid bind address");

    tracing::info!("Crypto Reports hub listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, gracefully stopping…");
}
