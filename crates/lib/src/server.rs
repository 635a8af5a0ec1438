//! HTTP server: mounts the input channels and serves them until shutdown.

use crate::channels::{register, InputChannel, MessageHandler, RestInput};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Router with every configured input channel mounted under `server.route`.
pub fn build_app(config: &Config, on_new_message: Arc<dyn MessageHandler>) -> Router {
    let input_channels: Vec<Arc<dyn InputChannel>> =
        vec![Arc::new(RestInput::from_config(&config.channels))];
    register(&input_channels, on_new_message, &config.server.route)
}

/// Serve the app on an already bound listener until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server exited")
}

/// Run the server on `server.bind:server.port`. Blocks until Ctrl+C or SIGTERM.
pub async fn run_server(config: Config, on_new_message: Arc<dyn MessageHandler>) -> Result<()> {
    let app = build_app(&config, on_new_message);
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("listening on {}", bind_addr);
    serve(listener, app, shutdown_signal()).await?;
    log::info!("server stopped");
    Ok(())
}

/// Completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
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
                log::warn!("failed to install SIGTERM handler: {}", e);
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
    log::info!("shutdown signal received, draining connections");
}
