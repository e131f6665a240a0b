//! The real-time transport layer.
//!
//! [`GameServer`] is a single actor task that owns the [`MatchEngine`], the
//! session registry (connection id → outbound queue) and the room channels
//! (room id → subscribed connections). Connection tasks talk to it through a
//! cloneable [`ServerHandle`]. Commands are processed to completion one at a
//! time, so no two commands ever race on a room, and each connection's
//! outbound queue preserves the order in which the engine produced messages.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), fading_tictactoe::GameError> {
//! use fading_tictactoe::config::ServerConfig;
//! use fading_tictactoe::server::{serve, GameServer};
//!
//! let config = ServerConfig::default();
//! let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
//! let handle = GameServer::spawn(&config);
//! serve(listener, handle).await
//! # }
//! ```

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::engine::{MatchEngine, RoomEvent};
use crate::error::{GameError, Result};
use crate::protocol::{Ack, ClientRequest, ServerMessage};
use crate::room::{ConnectionId, Room, RoomId, RoomStore};

/// A command received by the [`GameServer`].
#[derive(Debug)]
enum ServerCommand {
    Connect {
        outbound: mpsc::UnboundedSender<ServerMessage>,
        res_tx: oneshot::Sender<ConnectionId>,
    },

    Request {
        conn: ConnectionId,
        request: ClientRequest,
    },

    Disconnect {
        conn: ConnectionId,
    },

    RoomSnapshot {
        room_id: RoomId,
        res_tx: oneshot::Sender<Option<Room>>,
    },

    RoomCount {
        res_tx: oneshot::Sender<usize>,
    },
}

/// Authoritative game server.
///
/// Call and spawn [`run`](Self::run) to start processing commands, or use
/// [`spawn`](Self::spawn).
#[derive(Debug)]
pub struct GameServer {
    engine: MatchEngine,

    /// Outbound queue of every registered connection.
    sessions: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,

    /// Subscribers of each room channel.
    channels: HashMap<RoomId, HashSet<ConnectionId>>,

    /// The single channel each connection is subscribed to.
    subscriptions: HashMap<ConnectionId, RoomId>,

    cmd_rx: mpsc::UnboundedReceiver<ServerCommand>,
}

impl GameServer {
    pub fn new(config: &ServerConfig) -> (Self, ServerHandle) {
        Self::with_engine(MatchEngine::new(RoomStore::with_code_length(
            config.room_code_length,
        )))
    }

    /// A server around an existing engine.
    pub fn with_engine(engine: MatchEngine) -> (Self, ServerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                sessions: HashMap::new(),
                channels: HashMap::new(),
                subscriptions: HashMap::new(),
                cmd_rx,
            },
            ServerHandle { cmd_tx },
        )
    }

    /// Build a server and run it on the current tokio runtime.
    pub fn spawn(config: &ServerConfig) -> ServerHandle {
        let (server, handle) = Self::new(config);
        tokio::spawn(server.run());
        handle
    }

    /// Process commands until every [`ServerHandle`] is dropped.
    pub async fn run(mut self) {
        debug!("game server started");
        while let Some(cmd) = self.cmd_rx.recv().await {
            self.process_command(cmd);
        }
        info!(rooms = self.engine.rooms().len(), "game server stopped");
    }

    fn process_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { outbound, res_tx } => {
                let conn = self.connect(outbound);
                let _ = res_tx.send(conn);
            }

            ServerCommand::Request { conn, request } => self.on_request(conn, request),

            ServerCommand::Disconnect { conn } => self.disconnect(conn),

            ServerCommand::RoomSnapshot { room_id, res_tx } => {
                let _ = res_tx.send(self.engine.rooms().get(&room_id).cloned());
            }

            ServerCommand::RoomCount { res_tx } => {
                let _ = res_tx.send(self.engine.rooms().len());
            }
        }
    }

    /// Register a session under a fresh id and greet it.
    fn connect(&mut self, outbound: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let conn = Uuid::new_v4();
        let _ = outbound.send(ServerMessage::Welcome {
            connection_id: conn,
        });
        self.sessions.insert(conn, outbound);
        info!(conn = %conn, sessions = self.sessions.len(), "connection registered");
        conn
    }

    fn on_request(&mut self, conn: ConnectionId, request: ClientRequest) {
        if !self.sessions.contains_key(&conn) {
            warn!(conn = %conn, "request from unregistered connection, dropping");
            return;
        }

        let command = request.command.name();
        debug!(conn = %conn, request_id = request.request_id, command, "processing request");

        match self.engine.handle(conn, request.command) {
            Ok(dispatch) => {
                if let Some(room_id) = dispatch.joined {
                    self.subscribe(conn, room_id);
                }
                self.send_to(
                    conn,
                    ServerMessage::Ack {
                        request_id: request.request_id,
                        response: dispatch.ack,
                    },
                );
                self.deliver(dispatch.events);
            }
            Err(err) => {
                debug!(conn = %conn, command, error = %err, "request rejected");
                self.send_to(
                    conn,
                    ServerMessage::Ack {
                        request_id: request.request_id,
                        response: Ack::from(&err),
                    },
                );
            }
        }
    }

    /// Unregister a session and run the departure logic. Repeated calls for the
    /// same connection are ignored.
    fn disconnect(&mut self, conn: ConnectionId) {
        if self.sessions.remove(&conn).is_none() {
            debug!(conn = %conn, "disconnect for unknown connection ignored");
            return;
        }
        info!(conn = %conn, sessions = self.sessions.len(), "connection closed");

        self.unsubscribe(conn);
        let events = self.engine.handle_disconnect(conn);
        self.deliver(events);
    }

    /// Move `conn` onto the channel of `room_id`, leaving its previous one.
    fn subscribe(&mut self, conn: ConnectionId, room_id: RoomId) {
        self.unsubscribe(conn);
        self.channels
            .entry(room_id.clone())
            .or_default()
            .insert(conn);
        debug!(conn = %conn, room_id = %room_id, "subscribed to room channel");
        self.subscriptions.insert(conn, room_id);
    }

    fn unsubscribe(&mut self, conn: ConnectionId) {
        let Some(room_id) = self.subscriptions.remove(&conn) else {
            return;
        };
        if let Some(members) = self.channels.get_mut(&room_id) {
            members.remove(&conn);
            if members.is_empty() {
                self.channels.remove(&room_id);
            }
        }
    }

    /// Broadcast each event to its room channel, in order.
    fn deliver(&self, events: Vec<RoomEvent>) {
        for event in events {
            let Some(members) = self.channels.get(&event.room_id) else {
                debug!(room_id = %event.room_id, kind = event.message.name(), "no subscribers");
                continue;
            };
            for conn in members {
                self.send_to(*conn, event.message.clone());
            }
        }
    }

    fn send_to(&self, conn: ConnectionId, message: ServerMessage) {
        if let Some(outbound) = self.sessions.get(&conn) {
            // errors if the connection task already exited; its disconnect is queued
            let _ = outbound.send(message);
        }
    }
}

/// Handle and command sender for a [`GameServer`].
#[derive(Debug, Clone)]
pub struct ServerHandle {
    cmd_tx: mpsc::UnboundedSender<ServerCommand>,
}

impl ServerHandle {
    /// Register a connection's outbound queue and obtain its id. The queue
    /// receives a [`ServerMessage::Welcome`] first.
    ///
    /// # Errors
    ///
    /// [`GameError::ServerUnavailable`] if the server has stopped.
    pub async fn connect(
        &self,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId> {
        let (res_tx, res_rx) = oneshot::channel();
        self.send(ServerCommand::Connect { outbound, res_tx })?;
        res_rx.await.map_err(|_| GameError::ServerUnavailable)
    }

    /// Queue a request. Its acknowledgement arrives on the connection's
    /// outbound queue.
    ///
    /// # Errors
    ///
    /// [`GameError::ServerUnavailable`] if the server has stopped.
    pub fn request(&self, conn: ConnectionId, request: ClientRequest) -> Result<()> {
        self.send(ServerCommand::Request { conn, request })
    }

    /// Report that a connection is gone.
    ///
    /// # Errors
    ///
    /// [`GameError::ServerUnavailable`] if the server has stopped.
    pub fn disconnect(&self, conn: ConnectionId) -> Result<()> {
        self.send(ServerCommand::Disconnect { conn })
    }

    /// A copy of a room's current state.
    ///
    /// # Errors
    ///
    /// [`GameError::ServerUnavailable`] if the server has stopped.
    pub async fn room_snapshot(&self, room_id: impl Into<RoomId>) -> Result<Option<Room>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.send(ServerCommand::RoomSnapshot {
            room_id: room_id.into(),
            res_tx,
        })?;
        res_rx.await.map_err(|_| GameError::ServerUnavailable)
    }

    /// Number of live rooms.
    ///
    /// # Errors
    ///
    /// [`GameError::ServerUnavailable`] if the server has stopped.
    pub async fn room_count(&self) -> Result<usize> {
        let (res_tx, res_rx) = oneshot::channel();
        self.send(ServerCommand::RoomCount { res_tx })?;
        res_rx.await.map_err(|_| GameError::ServerUnavailable)
    }

    fn send(&self, cmd: ServerCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| GameError::ServerUnavailable)
    }
}

/// Accept TCP connections, upgrade them to WebSocket and pump each one
/// against the server.
///
/// Runs until the listener fails.
///
/// # Errors
///
/// Returns [`GameError::Io`] if accepting a connection fails.
#[cfg(feature = "transport-websocket")]
pub async fn serve(listener: tokio::net::TcpListener, server: ServerHandle) -> Result<()> {
    use crate::connection::serve_connection;
    use crate::transports::WebSocketTransport;

    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "listening for WebSocket connections");
    }

    loop {
        let (socket, peer) = listener.accept().await?;
        let server = server.clone();
        tokio::spawn(async move {
            let transport = match WebSocketTransport::accept(socket).await {
                Ok(transport) => transport,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "WebSocket handshake failed");
                    return;
                }
            };
            debug!(peer = %peer, "WebSocket connection accepted");
            if let Err(e) = serve_connection(transport, server).await {
                debug!(peer = %peer, error = %e, "connection ended with error");
            }
        });
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::board::Symbol;
    use crate::protocol::Command;

    struct Session {
        conn: ConnectionId,
        rx: mpsc::UnboundedReceiver<ServerMessage>,
    }

    impl Session {
        async fn open(handle: &ServerHandle) -> Self {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let conn = handle.connect(tx).await.unwrap();
            let welcome = rx.recv().await.unwrap();
            assert_eq!(
                welcome,
                ServerMessage::Welcome {
                    connection_id: conn
                }
            );
            Self { conn, rx }
        }

        async fn next(&mut self) -> ServerMessage {
            self.rx.recv().await.unwrap()
        }

        async fn ack(&mut self) -> Ack {
            match self.next().await {
                ServerMessage::Ack { response, .. } => response,
                other => panic!("expected ack, got {other:?}"),
            }
        }
    }

    fn start() -> ServerHandle {
        GameServer::spawn(&ServerConfig::default())
    }

    fn req(id: u64, command: Command) -> ClientRequest {
        ClientRequest {
            request_id: id,
            command,
        }
    }

    #[tokio::test]
    async fn ack_echoes_request_id() {
        let handle = start();
        let mut a = Session::open(&handle).await;

        handle.request(a.conn, req(42, Command::CreateRoom)).unwrap();
        match a.next().await {
            ServerMessage::Ack {
                request_id,
                response,
            } => {
                assert_eq!(request_id, 42);
                assert!(response.success);
                assert_eq!(response.symbol, Some(Symbol::O));
            }
            other => panic!("expected ack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_broadcast_reaches_both_members_after_ack() {
        let handle = start();
        let mut a = Session::open(&handle).await;
        let mut b = Session::open(&handle).await;

        handle.request(a.conn, req(1, Command::CreateRoom)).unwrap();
        let room_id = a.ack().await.room_id.unwrap();

        handle
            .request(
                b.conn,
                req(
                    1,
                    Command::JoinRoom {
                        room_id: room_id.clone(),
                    },
                ),
            )
            .unwrap();

        let ack = b.ack().await;
        assert_eq!(ack.symbol, Some(Symbol::X));

        let creator = a.conn;
        for session in [&mut a, &mut b] {
            assert!(matches!(
                session.next().await,
                ServerMessage::PlayerJoined { symbol: Symbol::X, .. }
            ));
            assert!(matches!(
                session.next().await,
                ServerMessage::GameStart { current_turn, .. } if current_turn == creator
            ));
        }
    }

    #[tokio::test]
    async fn failures_only_reach_the_caller() {
        let handle = start();
        let mut a = Session::open(&handle).await;
        let mut b = Session::open(&handle).await;

        handle.request(a.conn, req(1, Command::CreateRoom)).unwrap();
        let room_id = a.ack().await.room_id.unwrap();

        handle
            .request(
                b.conn,
                req(
                    2,
                    Command::MakeMove {
                        room_id: room_id.clone(),
                        position: 0,
                    },
                ),
            )
            .unwrap();
        let ack = b.ack().await;
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("player not found"));

        // Nothing else was queued for `a`.
        assert_eq!(handle.room_count().await.unwrap(), 1);
        assert!(a.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_notifies_remaining_member_once() {
        let handle = start();
        let mut a = Session::open(&handle).await;
        let mut b = Session::open(&handle).await;

        handle.request(a.conn, req(1, Command::CreateRoom)).unwrap();
        let room_id = a.ack().await.room_id.unwrap();
        handle
            .request(b.conn, req(1, Command::JoinRoom { room_id: room_id.clone() }))
            .unwrap();
        b.ack().await;
        for _ in 0..2 {
            a.next().await;
        }

        handle.disconnect(b.conn).unwrap();
        handle.disconnect(b.conn).unwrap();

        assert_eq!(
            a.next().await,
            ServerMessage::PlayerLeft { player_id: b.conn }
        );
        assert!(matches!(
            a.next().await,
            ServerMessage::GameOver {
                opponent_left: Some(true),
                winner: None,
                ..
            }
        ));

        let room = handle.room_snapshot(room_id).await.unwrap().unwrap();
        assert_eq!(room.players.len(), 1);
        assert!(room.game_over);
        assert!(a.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sole_player_disconnect_retires_room() {
        let handle = start();
        let mut a = Session::open(&handle).await;

        handle.request(a.conn, req(1, Command::CreateRoom)).unwrap();
        let room_id = a.ack().await.room_id.unwrap();

        handle.disconnect(a.conn).unwrap();
        assert_eq!(handle.room_count().await.unwrap(), 0);
        assert!(handle.room_snapshot(room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn moving_to_a_new_room_leaves_the_old_channel() {
        let handle = start();
        let mut a = Session::open(&handle).await;
        let mut b = Session::open(&handle).await;

        handle.request(a.conn, req(1, Command::CreateRoom)).unwrap();
        let first = a.ack().await.room_id.unwrap();
        handle
            .request(b.conn, req(1, Command::JoinRoom { room_id: first.clone() }))
            .unwrap();
        b.ack().await;
        for _ in 0..2 {
            a.next().await;
            b.next().await;
        }

        handle.request(a.conn, req(2, Command::CreateRoom)).unwrap();
        let second = a.ack().await.room_id.unwrap();
        assert_ne!(first, second);

        // Only the member left behind hears about the departure.
        assert_eq!(
            b.next().await,
            ServerMessage::PlayerLeft { player_id: a.conn }
        );
        assert!(matches!(b.next().await, ServerMessage::GameOver { .. }));
        assert_eq!(handle.room_count().await.unwrap(), 2);
        assert!(a.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stopped_server_reports_unavailable() {
        let (server, handle) = GameServer::new(&ServerConfig::default());
        drop(server);

        let err = handle.room_count().await.unwrap_err();
        assert!(matches!(err, GameError::ServerUnavailable));
        assert!(matches!(
            handle.disconnect(Uuid::new_v4()),
            Err(GameError::ServerUnavailable)
        ));
    }
}
