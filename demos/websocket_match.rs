//! # WebSocket Match Example
//!
//! Starts the game server on a local port and connects two clients to it over
//! real WebSockets, then plays until O wins on the main diagonal.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example websocket_match
//!
//! # Connect to an already running server instead:
//! FADING_TICTACTOE_URL=ws://127.0.0.1:3001 cargo run --example websocket_match
//! ```

use fading_tictactoe::server::serve;
use fading_tictactoe::{
    ClientConfig, GameClient, GameEvent, GameServer, ServerConfig, WebSocketTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Server ──────────────────────────────────────────────────────
    let url = match std::env::var("FADING_TICTACTOE_URL") {
        Ok(url) => url,
        Err(_) => {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;
            let server = GameServer::spawn(&ServerConfig::default());
            tokio::spawn(serve(listener, server));
            format!("ws://{addr}")
        }
    };
    tracing::info!("Connecting to {url}");

    // ── Players ─────────────────────────────────────────────────────
    let (mut alice, mut alice_events) =
        GameClient::start(WebSocketTransport::connect(&url).await?, ClientConfig::new());
    let (mut bob, mut bob_events) =
        GameClient::start(WebSocketTransport::connect(&url).await?, ClientConfig::new());

    // Log everything bob sees.
    let watcher = tokio::spawn(async move {
        while let Some(event) = bob_events.recv().await {
            tracing::info!("bob <- {event:?}");
            if matches!(event, GameEvent::Disconnected { .. }) {
                break;
            }
        }
    });

    let room = alice
        .create_room()
        .await?
        .room_id
        .ok_or("createRoom was not acknowledged with a room")?;
    bob.join_room(room.clone()).await?;

    for (turn, position) in [0, 1, 4, 2, 8].into_iter().enumerate() {
        let client = if turn % 2 == 0 { &alice } else { &bob };
        let ack = client.make_move(room.clone(), position).await?;
        tracing::info!("move {position}: success={} game_over={:?}", ack.success, ack.game_over);
    }

    while let Some(event) = alice_events.recv().await {
        if let GameEvent::GameOver {
            winner,
            winning_line,
            ..
        } = event
        {
            tracing::info!("game over: winner={winner:?} line={winning_line:?}");
            break;
        }
    }

    // ── Shutdown ────────────────────────────────────────────────────
    alice.shutdown().await;
    bob.shutdown().await;
    let _ = watcher.await;
    Ok(())
}
