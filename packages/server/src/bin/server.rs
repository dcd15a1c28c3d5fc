//! WebSocket room hub server.
//!
//! Coordinates rooms of a turn-based drawing game: relays chat and strokes,
//! runs round countdowns and aggregates scores, backed by the identity, room
//! and game directory services.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin atelier-server
//! cargo run --bin atelier-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use atelier_server::{
    hub::RoomHub,
    infrastructure::{
        directory::{HttpGameDirectory, HttpIdentityService, HttpRoomDirectory},
        pusher::WebSocketMessagePusher,
    },
    ui::Server,
};
use atelier_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "atelier-server")]
#[command(about = "WebSocket room hub for turn-based drawing games", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Base URL of the directory services
    #[arg(long, default_value = "http://127.0.0.1:9000")]
    directory_url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Directory clients
    // 2. MessagePusher
    // 3. RoomHub
    // 4. Server

    // 1. Create directory clients (one shared HTTP connection pool)
    let http = reqwest::Client::new();
    let identity = Arc::new(HttpIdentityService::new(
        http.clone(),
        args.directory_url.clone(),
    ));
    let rooms = Arc::new(HttpRoomDirectory::new(
        http.clone(),
        args.directory_url.clone(),
    ));
    let games = Arc::new(HttpGameDirectory::new(http, args.directory_url.clone()));
    tracing::info!("Directory services at {}", args.directory_url);

    // 2. Create MessagePusher (WebSocket implementation)
    let pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create the RoomHub
    let hub = Arc::new(RoomHub::new(pusher, identity, rooms, games));

    // 4. Create and run the server
    let server = Server::new(hub);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
