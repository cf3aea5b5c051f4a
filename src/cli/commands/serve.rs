use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info, trace, warn};

use crate::config::{initialize_app_state, Settings};
use crate::router::create_router;

/// Resolves on Ctrl-C; in-flight requests are drained before exit.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

pub async fn serve(settings: Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("BOSS dispatch server starting up");
    debug!("Settings: {:?}", settings);

    let bind_address = settings.bind_address.clone();
    let state = initialize_app_state(settings)
        .await
        .context("Failed to initialize application state")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to address {}", bind_address))?;

    info!("BOSS API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown gracefully");
    Ok(())
}
