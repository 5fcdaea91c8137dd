use axum::Router;
use configs::RelayConfig;
use service::observability;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// Build the router for an already-loaded config.
pub fn build_app(config: &RelayConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(config)?;
    observability::init();
    Ok(routes::build_router(state))
}

/// Public entry: bind and serve until a shutdown signal arrives.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let app = build_app(&config)?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server is running on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server drained, exiting");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
