//! UTTT Server - HTTP API for online rooms
//!
//! This crate provides the web backend:
//! - Room lobby (create, join, leave, rejoin)
//! - Versioned move submission with typed rejections
//! - Rematch handling
//! - Periodic expiry of idle rooms

mod error;
mod routes;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uttt_sync::RoomStore;

pub use error::ApiError;
pub use state::ServerState;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Idle time after which a room is dropped
    pub room_ttl: Duration,
    /// How often the expiry sweep runs
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8003,
            room_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_room_ttl(mut self, ttl: Duration) -> Self {
        self.room_ttl = ttl;
        self
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Lobby
        .route("/api/room/create", post(routes::room::create_room))
        .route("/api/room/join", post(routes::room::join_room))
        .route("/api/room/leave", post(routes::room::leave_room))
        .route("/api/room/rejoin", post(routes::room::rejoin_room))
        // Game
        .route("/api/game/:room_id", get(routes::game::get_game))
        .route("/api/game/:room_id/move", post(routes::game::submit_move))
        .route("/api/game/:room_id/rematch", post(routes::game::request_rematch))
        // Shared state
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Periodically drop rooms idle for longer than the configured TTL
pub fn spawn_room_sweeper(store: Arc<dyn RoomStore>, config: &ServerConfig) -> tokio::task::JoinHandle<()> {
    let ttl = config.room_ttl;
    let mut interval = tokio::time::interval(config.sweep_interval);

    tokio::spawn(async move {
        loop {
            interval.tick().await;
            match store.sweep_expired(ttl) {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "expired rooms swept"),
                Err(err) => tracing::warn!(%err, "room sweep failed"),
            }
        }
    })
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(ServerState::new());
    let sweeper = spawn_room_sweeper(Arc::clone(&state.store), &config);
    let router = create_router(state);

    tracing::info!("UTTT Server starting on http://0.0.0.0:{}", config.port);
    tracing::info!(
        "Rooms expire after {}h idle (sweep every {}s)",
        config.room_ttl.as_secs() / 3600,
        config.sweep_interval.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, router).await;
    sweeper.abort();
    served?;

    Ok(())
}
