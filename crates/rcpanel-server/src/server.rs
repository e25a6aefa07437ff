//! HTTP server implementation using Axum.

use crate::handlers;
use axum::Router;
use rcpanel_core::{JobTracker, RcClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Typed RC client over whichever transport was configured
    pub client: RcClient,
    /// Job status views over the same client
    pub jobs: JobTracker,
}

impl AppState {
    pub fn new(client: RcClient) -> Self {
        Self {
            jobs: JobTracker::new(client.clone()),
            client,
        }
    }
}

/// Build the panel router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    handlers::routes(Arc::new(state)).into_router().layer(cors)
}

/// Start the panel HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: AppState, addr: &str) -> anyhow::Result<SocketAddr> {
    let app = build_router(state);

    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
