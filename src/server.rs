//! Router construction and the listen loop

use axum::{Router, extract::DefaultBodyLimit, routing};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::SharedState;
use crate::error::Result;
use crate::handlers::{handle_webhook, not_found};

/// Largest webhook body buffered; GitHub caps deliveries at 25 MB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Mounts the webhook path for POST; everything else answers 404.
pub fn create_router(state: SharedState) -> Router {
    let webhook_path = state.config.webhook_path.clone();
    Router::new()
        .route(
            &webhook_path,
            routing::post(handle_webhook).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .with_state(state)
}

/// Binds the configured address and serves until the process exits.
///
/// Failing to bind is the only fatal error.
pub async fn serve(state: SharedState) -> Result<()> {
    let bind_address = state.config.bind_address();
    let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
        error!("Failed to bind {}: {}", bind_address, e);
        e
    })?;
    serve_on(listener, state).await
}

pub async fn serve_on(listener: TcpListener, state: SharedState) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("--- Webhook Listener Started ---");
    info!(
        "Listening on {} for webhooks at {}",
        local_addr, state.config.webhook_path
    );
    info!(
        "Action script: {}",
        state.dispatcher.script_path().display()
    );
    if state.config.needs_signature() {
        info!("Payload signatures are required");
    }
    info!(
        "To reach this listener from the internet, expose it with e.g. `tailscale serve localhost:{}`",
        local_addr.port()
    );

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
