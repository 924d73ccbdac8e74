//! Example to run the UTTT server standalone
//!
//! Run with: cargo run -p uttt-server --example run_server

use tracing_subscriber::EnvFilter;
use uttt_server::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::default();

    println!("Starting UTTT server on port {}", config.port);
    println!("Create a room: curl -X POST localhost:{}/api/room/create -H 'content-type: application/json' -d '{{}}'", config.port);

    run_server(config).await
}
