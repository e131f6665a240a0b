//! WebSocket game server.
//!
//! ```sh
//! FADING_TTT_BIND=127.0.0.1:3001 RUST_LOG=debug cargo run --bin fading-tictactoe-server
//! ```

use fading_tictactoe::config::ServerConfig;
use fading_tictactoe::logging;
use fading_tictactoe::server::{serve, GameServer};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    logging::init("info")?;

    let config = ServerConfig::from_env();
    tracing::info!(
        bind_addr = %config.bind_addr,
        room_code_length = config.room_code_length,
        "starting fading tic-tac-toe server"
    );

    let listener = TcpListener::bind(&config.bind_addr).await?;
    let handle = GameServer::spawn(&config);

    tokio::select! {
        result = serve(listener, handle) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
