// src/web/mod.rs - Keep-alive HTTP endpoint for deployment platform pings

use axum::{routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;

/// Start the keep-alive HTTP server. Hosting platforms that sleep idle
/// deployments ping this to keep the bot process running.
pub async fn start_keepalive_server(port: u16) {
    let app = Router::new().route("/", get(alive_handler));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind keep-alive port {}: {}", port, e);
            return;
        }
    };

    info!("Keep-alive endpoint listening on port {}", port);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Keep-alive server error: {}", e);
    }
}

/// Spawn the keep-alive server as a background task.
pub fn spawn_keepalive_server(port: u16) {
    tokio::spawn(async move {
        start_keepalive_server(port).await;
    });
}

async fn alive_handler() -> &'static str {
    "Bot is alive!"
}
