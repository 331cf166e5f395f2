//! HTTP Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use match_core::SessionRegistry;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

/// Start the HTTP server
pub async fn start_server(port: u16, registry: SessionRegistry) -> anyhow::Result<()> {
    let state = AppState {
        registry: Arc::new(registry),
    };

    let app = Router::new()
        .merge(routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Matchmaking API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Peer addresses feed owner_address/host_address, so the service must
    // run with connect info available
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
