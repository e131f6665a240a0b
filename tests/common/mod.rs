#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for the integration tests.
//!
//! Runs a real [`GameServer`] on the test runtime and connects peers to it
//! over in-process [`LocalTransport`] pairs, either as raw JSON frames
//! ([`RawPeer`]) or through a [`GameClient`].

use std::time::Duration;

use fading_tictactoe::connection::serve_connection;
use fading_tictactoe::protocol::{Ack, ServerMessage};
use fading_tictactoe::{
    ClientConfig, ClientRequest, Command, ConnectionId, GameClient, GameEvent, GameServer,
    LocalTransport, ServerConfig, ServerHandle, Transport,
};
use tokio::sync::mpsc;

/// How long a test waits for any single message before failing.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(2);

/// Spawn a game server with default configuration.
pub fn spawn_server() -> ServerHandle {
    GameServer::spawn(&ServerConfig::default())
}

/// Attach a fresh in-process connection to `server` and return the peer end.
pub fn attach(server: &ServerHandle) -> LocalTransport {
    let (server_end, peer) = LocalTransport::pair();
    tokio::spawn(serve_connection(server_end, server.clone()));
    peer
}

// ── RawPeer ─────────────────────────────────────────────────────────

/// A connection that speaks raw JSON frames, as a non-Rust client would.
pub struct RawPeer {
    pub id: ConnectionId,
    transport: LocalTransport,
    next_request_id: u64,
}

impl RawPeer {
    /// Connect and consume the `welcome` message.
    pub async fn connect(server: &ServerHandle) -> Self {
        let mut transport = attach(server);
        let welcome = next_message(&mut transport).await;
        let ServerMessage::Welcome { connection_id } = welcome else {
            panic!("expected welcome, got {welcome:?}");
        };
        Self {
            id: connection_id,
            transport,
            next_request_id: 1,
        }
    }

    /// Send `command` and return the acknowledgement.
    pub async fn request(&mut self, command: Command) -> Ack {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let frame = serde_json::to_string(&ClientRequest {
            request_id,
            command,
        })
        .unwrap();
        self.transport.send(frame).await.unwrap();

        match self.next().await {
            ServerMessage::Ack {
                request_id: id,
                response,
            } => {
                assert_eq!(id, request_id, "ack for the wrong request");
                response
            }
            other => panic!("expected ack for request {request_id}, got {other:?}"),
        }
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.transport.send(frame.to_string()).await.unwrap();
    }

    pub async fn next(&mut self) -> ServerMessage {
        next_message(&mut self.transport).await
    }

    /// Assert nothing else is queued for this peer right now.
    pub async fn assert_idle(&mut self) {
        let pending = tokio::time::timeout(Duration::from_millis(50), self.transport.recv()).await;
        assert!(pending.is_err(), "unexpected frame: {pending:?}");
    }

    pub async fn close(mut self) {
        self.transport.close().await.unwrap();
    }
}

async fn next_message(transport: &mut LocalTransport) -> ServerMessage {
    let frame = tokio::time::timeout(STEP_TIMEOUT, transport.recv())
        .await
        .expect("timed out waiting for a server message")
        .expect("connection closed")
        .expect("transport error");
    serde_json::from_str(&frame).unwrap()
}

// ── GameClient helpers ──────────────────────────────────────────────

/// Connect a [`GameClient`] to `server` and wait for its `Welcome`.
pub async fn connect_client(server: &ServerHandle) -> (GameClient, mpsc::Receiver<GameEvent>) {
    let (client, mut events) = GameClient::start(attach(server), ClientConfig::new());
    next_matching(&mut events, |e| matches!(e, GameEvent::Welcome { .. })).await;
    (client, events)
}

/// Receive events until one satisfies `pred`, returning it.
pub async fn next_matching(
    events: &mut mpsc::Receiver<GameEvent>,
    pred: impl Fn(&GameEvent) -> bool,
) -> GameEvent {
    loop {
        let event = tokio::time::timeout(STEP_TIMEOUT, events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}
