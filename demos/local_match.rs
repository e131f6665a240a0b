//! # Local Match Example
//!
//! Runs a game server and two clients in one process, connected by
//! [`LocalTransport`] pairs, and plays a game long enough for the fading rule
//! to kick in.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example local_match --features tokio-runtime
//!
//! # Watch the server's decisions:
//! RUST_LOG=fading_tictactoe=debug cargo run --example local_match --features tokio-runtime
//! ```

use fading_tictactoe::connection::serve_connection;
use fading_tictactoe::{
    Board, ClientConfig, GameClient, GameEvent, GameServer, LocalTransport, MatchView,
    ServerConfig, ServerHandle,
};
use tokio::sync::mpsc;

/// Moves for O and X in turn. O's fourth mark (on 5) erases its first (on 0).
const SCRIPT: [usize; 9] = [0, 3, 1, 4, 8, 6, 5, 0, 2];

fn connect(server: &ServerHandle) -> (GameClient, mpsc::Receiver<GameEvent>) {
    let (server_end, client_end) = LocalTransport::pair();
    tokio::spawn(serve_connection(server_end, server.clone()));
    GameClient::start(client_end, ClientConfig::new())
}

/// Apply queued events to `view` until one matches `done`.
async fn follow(
    view: &mut MatchView,
    events: &mut mpsc::Receiver<GameEvent>,
    done: impl Fn(&GameEvent) -> bool,
) -> Option<GameEvent> {
    while let Some(event) = events.recv().await {
        view.apply(&event);
        if done(&event) {
            return Some(event);
        }
    }
    None
}

fn render(board: &Board) -> String {
    board
        .cells()
        .chunks(3)
        .map(|row| {
            row.iter()
                .map(|cell| cell.map_or_else(|| ".".to_string(), |s| s.to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Server and players ──────────────────────────────────────────
    let server = GameServer::spawn(&ServerConfig::default());
    let (mut alice, mut alice_events) = connect(&server);
    let (mut bob, mut bob_events) = connect(&server);

    let mut alice_view = MatchView::new();
    let mut bob_view = MatchView::new();
    follow(&mut alice_view, &mut alice_events, |e| matches!(e, GameEvent::Welcome { .. })).await;
    follow(&mut bob_view, &mut bob_events, |e| matches!(e, GameEvent::Welcome { .. })).await;

    let room = alice
        .create_room()
        .await?
        .room_id
        .ok_or("createRoom was not acknowledged with a room")?;
    tracing::info!("alice created room {room}");

    let ack = bob.join_room(room.clone()).await?;
    tracing::info!("bob joined as {:?}", ack.symbol);
    follow(&mut alice_view, &mut alice_events, |e| matches!(e, GameEvent::GameStart { .. })).await;
    follow(&mut bob_view, &mut bob_events, |e| matches!(e, GameEvent::GameStart { .. })).await;

    // ── Play ────────────────────────────────────────────────────────
    for (turn, &position) in SCRIPT.iter().enumerate() {
        let (name, client) = if turn % 2 == 0 {
            ("alice", &alice)
        } else {
            ("bob", &bob)
        };
        let ack = client.make_move(room.clone(), position).await?;
        if !ack.success {
            tracing::warn!("{name}'s move on {position} rejected: {:?}", ack.message);
            break;
        }

        let is_update = |e: &GameEvent| {
            matches!(e, GameEvent::MoveMade { .. } | GameEvent::GameOver { .. })
        };
        follow(&mut alice_view, &mut alice_events, is_update).await;
        follow(&mut bob_view, &mut bob_events, is_update).await;

        println!("{name} plays {position}:\n{}\n", render(&alice_view.board));
        if let Some(fade) = alice_view.fade_index {
            println!("(cell {fade} fades on the next move)\n");
        }
        if alice_view.game_over {
            break;
        }
    }

    println!("alice: {}", alice_view.status());
    println!("bob:   {}", bob_view.status());

    // ── Shutdown ────────────────────────────────────────────────────
    alice.shutdown().await;
    bob.shutdown().await;
    Ok(())
}
