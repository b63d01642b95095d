//! Gateway server setup
//!
//! Wires the coordination core to its collaborators and hosts it behind a
//! WebSocket endpoint.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{routing::get, Router};
use chatd_common::AppConfig;
use chatd_core::RoomName;
use chatd_presence::{PresenceCoordinator, PresenceSettings};
use chatd_store::{MemoryMessageStore, TokenDirectory};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Gateway startup errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),

    #[error("Invalid listen address {0}: {1}")]
    Address(String, std::net::AddrParseError),
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the coordination core and create `GatewayState`
///
/// The coordinator runs on its own task for the lifetime of the process.
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let settings = PresenceSettings {
        default_room: RoomName::from(config.presence.default_room.clone()),
        backlog_limit: config.presence.backlog_limit,
        handshake_timeout: config.presence.handshake_timeout(),
        typing_decay: config.presence.typing_decay(),
    };

    let coordinator = PresenceCoordinator::new(
        settings,
        Arc::new(TokenDirectory::new()),
        Arc::new(MemoryMessageStore::new()),
    );
    let presence = coordinator.handle();
    tokio::spawn(coordinator.run());

    GatewayState::new(presence, config)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;

    tracing::info!("Gateway listening on ws://{addr}/ws");

    axum::serve(listener, app).await.map_err(GatewayError::Serve)
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), GatewayError> {
    let raw_addr = config.gateway.address();
    let addr: SocketAddr = raw_addr
        .parse()
        .map_err(|e| GatewayError::Address(raw_addr, e))?;

    let state = create_gateway_state(config);
    let app = create_app(state);

    run_server(app, addr).await
}
