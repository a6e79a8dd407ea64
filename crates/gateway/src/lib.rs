//! API Gateway Library
//!
//! HTTP REST surface over the embedded user service.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use tracing::info;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Open the user store and serve HTTP until the process is stopped.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let users = user_service_lib::build_user_service(&config.users).await?;

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(users, config);
    let app = create_router(state);

    info!("Gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
