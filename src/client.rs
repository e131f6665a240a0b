//! Async client for the fading tic-tac-toe server.
//!
//! [`GameClient`] is a thin handle that talks to a background transport loop
//! over an unbounded MPSC channel. Every request returns a future that
//! resolves with the server's [`Ack`]; everything the server sends, including
//! those acknowledgements, is also emitted on the bounded
//! [`GameEvent`] channel returned from [`GameClient::start`].
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), fading_tictactoe::GameError> {
//! use fading_tictactoe::{ClientConfig, GameClient, GameEvent, WebSocketTransport};
//!
//! let transport = WebSocketTransport::connect("ws://localhost:3001").await?;
//! let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());
//!
//! let ack = client.create_room().await?;
//! println!("share this code: {:?}", ack.room_id);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         GameEvent::GameStart { .. } => { /* … */ }
//!         GameEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

use crate::board::Symbol;
use crate::error::{GameError, Result};
use crate::event::GameEvent;
use crate::protocol::{Ack, ClientRequest, Command, ServerMessage};
use crate::room::{ConnectionId, RoomId};
use crate::transport::Transport;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default time to wait for a request's acknowledgement.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GameClient`].
///
/// ```
/// use std::time::Duration;
/// use fading_tictactoe::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_event_channel_capacity(64)
///     .with_request_timeout(Duration::from_secs(2));
/// assert_eq!(config.event_channel_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Capacity of the event channel. When it is full, events other than
    /// [`GameEvent::Disconnected`] are dropped with a warning. Clamped to at
    /// least 1.
    pub event_channel_capacity: usize,

    /// How long [`GameClient::shutdown`] waits for the transport loop before
    /// aborting it.
    pub shutdown_timeout: Duration,

    /// How long a request waits for its acknowledgement.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Shared state ────────────────────────────────────────────────────

struct ClientState {
    connected: AtomicBool,
    connection_id: Mutex<Option<ConnectionId>>,
    room_id: Mutex<Option<RoomId>>,
    symbol: Mutex<Option<Symbol>>,
}

impl ClientState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            connection_id: Mutex::new(None),
            room_id: Mutex::new(None),
            symbol: Mutex::new(None),
        }
    }
}

/// A request on its way to the transport loop, with the slot for its reply.
struct Outgoing {
    request: ClientRequest,
    reply_tx: oneshot::Sender<Ack>,
}

// ── Client handle ───────────────────────────────────────────────────

/// Handle to one connection to the game server.
///
/// Dropping the handle aborts the transport loop; call
/// [`shutdown`](Self::shutdown) to close the transport gracefully.
pub struct GameClient {
    cmd_tx: mpsc::UnboundedSender<Outgoing>,
    state: Arc<ClientState>,
    next_request_id: AtomicU64,
    request_timeout: Duration,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl GameClient {
    /// Spawn the transport loop over `transport` and return the client handle
    /// together with its event receiver. [`GameEvent::Connected`] is always the
    /// first event.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<GameEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Outgoing>();
        // tokio panics on a zero capacity.
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<GameEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ClientState::new());
        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            Arc::clone(&state),
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            state,
            next_request_id: AtomicU64::new(1),
            request_timeout: config.request_timeout,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Create a room and take its `O` seat.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn create_room(&self) -> Result<Ack> {
        self.request(Command::CreateRoom).await
    }

    /// Take the open seat in `room_id`. A failed ack carries `"room not found"`
    /// or `"Room is full"`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn join_room(&self, room_id: impl Into<RoomId>) -> Result<Ack> {
        self.request(Command::JoinRoom {
            room_id: room_id.into(),
        })
        .await
    }

    /// Place a mark on `position` (0..=8, row-major from the top-left).
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn make_move(&self, room_id: impl Into<RoomId>, position: usize) -> Result<Ack> {
        self.request(Command::MakeMove {
            room_id: room_id.into(),
            position,
        })
        .await
    }

    /// Start a new game in `room_id`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn restart_game(&self, room_id: impl Into<RoomId>) -> Result<Ack> {
        self.request(Command::GameRestart {
            room_id: room_id.into(),
        })
        .await
    }

    /// Send `command` and wait for its acknowledgement.
    ///
    /// Rule violations are not errors here: they come back as an [`Ack`] with
    /// `success == false`, a `message` and an `error_code`.
    ///
    /// # Errors
    ///
    /// - [`GameError::TransportDisconnected`] if the connection is gone or
    ///   drops before the acknowledgement arrives.
    /// - [`GameError::Timeout`] if no acknowledgement arrives within
    ///   [`ClientConfig::request_timeout`].
    pub async fn request(&self, command: Command) -> Result<Ack> {
        if !self.is_connected() {
            return Err(GameError::TransportDisconnected);
        }
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Outgoing {
                request: ClientRequest {
                    request_id,
                    command,
                },
                reply_tx,
            })
            .map_err(|_| GameError::TransportDisconnected)?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(GameError::TransportDisconnected),
            Err(_) => {
                warn!(request_id, "request timed out");
                Err(GameError::Timeout)
            }
        }
    }

    /// Gracefully shut down: close the transport, emit
    /// [`GameEvent::Disconnected`], and wait for the loop to exit.
    pub async fn shutdown(&mut self) {
        debug!("GameClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Abort the loop if it does not exit in time so it cannot run detached.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// The id the server greeted this connection with.
    pub async fn connection_id(&self) -> Option<ConnectionId> {
        *self.state.connection_id.lock().await
    }

    /// The room this client is seated in; cleared on disconnect.
    pub async fn current_room_id(&self) -> Option<RoomId> {
        self.state.room_id.lock().await.clone()
    }

    /// The symbol this client plays in its current room.
    pub async fn symbol(&self) -> Option<Symbol> {
        *self.state.symbol.lock().await
    }
}

impl std::fmt::Debug for GameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("connected", &self.is_connected())
            .field("next_request_id", &self.next_request_id.load(Ordering::Relaxed))
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        // No executor to drive an async close here; abort the loop instead.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background task that owns the transport.
///
/// Pending acknowledgements live here; when the loop exits they are dropped,
/// which fails their waiting requests with
/// [`GameError::TransportDisconnected`].
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<Outgoing>,
    event_tx: mpsc::Sender<GameEvent>,
    state: Arc<ClientState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");
    let mut pending: HashMap<u64, oneshot::Sender<Ack>> = HashMap::new();

    emit_event(&event_tx, GameEvent::Connected).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Outgoing { request, reply_tx }) => {
                        debug!(
                            request_id = request.request_id,
                            command = request.command.name(),
                            "sending request"
                        );
                        match serde_json::to_string(&request) {
                            Ok(json) => {
                                pending.insert(request.request_id, reply_tx);
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &state,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            Err(e) => {
                                // Dropping `reply_tx` fails only this request.
                                error!("failed to serialize request: {e}");
                            }
                        }
                    }
                    // Unreachable while the handle is alive: it owns `cmd_tx`.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                break;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            update_state(&state, &msg).await;
                            if let ServerMessage::Ack { request_id, response } = &msg {
                                match pending.remove(request_id) {
                                    Some(reply_tx) => {
                                        let _ = reply_tx.send(response.clone());
                                    }
                                    None => debug!(request_id, "ack for unknown or expired request"),
                                }
                            }
                            emit_event(&event_tx, GameEvent::from(msg)).await;
                        }
                        Err(e) => {
                            warn!("failed to deserialize server message: {e} (raw: {text})");
                        }
                    },
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &state,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &state, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!(abandoned = pending.len(), "transport loop exited");
}

/// Track the connection id and the seat from server messages.
async fn update_state(state: &ClientState, msg: &ServerMessage) {
    match msg {
        ServerMessage::Welcome { connection_id } => {
            *state.connection_id.lock().await = Some(*connection_id);
            debug!(conn = %connection_id, "state: welcomed");
        }
        ServerMessage::Ack { response, .. } if response.success => {
            if let (Some(room_id), Some(symbol)) = (&response.room_id, response.symbol) {
                *state.room_id.lock().await = Some(room_id.clone());
                *state.symbol.lock().await = Some(symbol);
                debug!(room_id = %room_id, %symbol, "state: seated");
            }
        }
        _ => {}
    }
}

/// Emit an event without blocking the loop; drops it with a warning when the
/// channel is full.
async fn emit_event(event_tx: &mpsc::Sender<GameEvent>, event: GameEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("event channel full, dropping event: {dropped:?}");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit [`GameEvent::Disconnected`], mark the client disconnected and forget
/// its seat.
///
/// Waits for channel capacity: this is always the last event and is never
/// dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<GameEvent>,
    state: &ClientState,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    *state.room_id.lock().await = None;
    *state.symbol.lock().await = None;
    if event_tx
        .send(GameEvent::Disconnected { reason })
        .await
        .is_err()
    {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::error_codes::ErrorCode;
    use crate::transports::LocalTransport;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    // ── Mock transport ──────────────────────────────────────────────

    /// Records sent frames and replays scripted incoming ones.
    struct MockTransport {
        incoming: VecDeque<Option<std::result::Result<String, GameError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, GameError>>>,
        ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let transport = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (transport, sent, closed)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), GameError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, GameError>> {
            if let Some(item) = self.incoming.pop_front() {
                item
            } else {
                // Script exhausted: stay open until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), GameError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn frame(msg: &ServerMessage) -> Option<std::result::Result<String, GameError>> {
        Some(Ok(serde_json::to_string(msg).unwrap()))
    }

    /// Read one request from the server end of a local pair.
    async fn read_request(peer: &mut LocalTransport) -> ClientRequest {
        serde_json::from_str(&peer.recv().await.unwrap().unwrap()).unwrap()
    }

    async fn reply(peer: &mut LocalTransport, request_id: u64, response: Ack) {
        let msg = ServerMessage::Ack {
            request_id,
            response,
        };
        peer.send(serde_json::to_string(&msg).unwrap())
            .await
            .unwrap();
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn connected_is_first_event() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let first = events.recv().await.unwrap();
        assert_eq!(first, GameEvent::Connected);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn welcome_sets_connection_id() {
        let id = Uuid::from_u128(9);
        let (transport, _sent, _closed) =
            MockTransport::new(vec![frame(&ServerMessage::Welcome { connection_id: id })]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::Welcome { connection_id: id }
        );
        assert_eq!(client.connection_id().await, Some(id));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn create_room_resolves_with_ack_and_records_seat() {
        let (transport, mut peer) = LocalTransport::pair();
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());
        let _ = events.recv().await; // Connected

        let server = tokio::spawn(async move {
            let request = read_request(&mut peer).await;
            assert_eq!(request.command, Command::CreateRoom);
            reply(&mut peer, request.request_id, Ack::seated("ROOM42".into(), Symbol::O)).await;
            peer
        });

        let ack = client.create_room().await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.room_id.as_deref(), Some("ROOM42"));
        assert_eq!(client.current_room_id().await.as_deref(), Some("ROOM42"));
        assert_eq!(client.symbol().await, Some(Symbol::O));

        assert!(matches!(
            events.recv().await.unwrap(),
            GameEvent::Acknowledged { request_id: 1, .. }
        ));

        let _peer = server.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn rejected_request_is_a_failed_ack_not_an_error() {
        let (transport, mut peer) = LocalTransport::pair();
        let (mut client, _events) = GameClient::start(transport, ClientConfig::new());

        let server = tokio::spawn(async move {
            let request = read_request(&mut peer).await;
            assert_eq!(
                request.command,
                Command::JoinRoom {
                    room_id: "NOPE00".into()
                }
            );
            reply(
                &mut peer,
                request.request_id,
                Ack::failure("room not found", ErrorCode::RoomNotFound),
            )
            .await;
            peer
        });

        let ack = client.join_room("NOPE00").await.unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("room not found"));
        assert_eq!(ack.error_code, Some(ErrorCode::RoomNotFound));
        assert!(client.current_room_id().await.is_none());

        let _peer = server.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn acks_are_matched_by_request_id() {
        let (transport, mut peer) = LocalTransport::pair();
        let (mut client, _events) = GameClient::start(transport, ClientConfig::new());

        let server = tokio::spawn(async move {
            let first = read_request(&mut peer).await;
            let second = read_request(&mut peer).await;
            // Answer out of order.
            reply(&mut peer, second.request_id, Ack::moved(Board::EMPTY, false, false)).await;
            reply(&mut peer, first.request_id, Ack::ok()).await;
            peer
        });

        let (restart, make_move) =
            tokio::join!(client.restart_game("R"), async {
                tokio::task::yield_now().await;
                client.make_move("R", 4).await
            });
        let restart = restart.unwrap();
        let make_move = make_move.unwrap();
        assert_eq!(restart, Ack::ok());
        assert_eq!(make_move.board, Some(Board::EMPTY));

        let _peer = server.await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn request_times_out_without_ack() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = ClientConfig::new().with_request_timeout(Duration::from_millis(30));
        let (mut client, _events) = GameClient::start(transport, config);

        let err = client.make_move("ROOM01", 4).await.unwrap_err();
        assert!(matches!(err, GameError::Timeout));

        let sent = sent.lock().unwrap().clone();
        let request: ClientRequest = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            request.command,
            Command::MakeMove {
                room_id: "ROOM01".into(),
                position: 4
            }
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn pending_request_fails_when_server_closes() {
        let (transport, mut peer) = LocalTransport::pair();
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let server = tokio::spawn(async move {
            let _ = read_request(&mut peer).await;
            peer.close().await.unwrap();
        });

        let err = client.create_room().await.unwrap_err();
        assert!(matches!(err, GameError::TransportDisconnected));
        server.await.unwrap();

        let _ = events.recv().await; // Connected
        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::Disconnected { reason: None }
        );
        assert!(!client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn requests_after_shutdown_fail_fast() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);
        let (mut client, _events) = GameClient::start(transport, ClientConfig::new());

        client.shutdown().await;
        let err = client.create_room().await.unwrap_err();
        assert!(matches!(err, GameError::TransportDisconnected));
    }

    #[tokio::test]
    async fn broadcasts_become_events_in_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let mut board = Board::EMPTY;
        board.set(4, Some(Symbol::O));
        let (transport, _sent, _closed) = MockTransport::new(vec![
            frame(&ServerMessage::PlayerJoined {
                player_id: b,
                symbol: Symbol::X,
            }),
            frame(&ServerMessage::GameStart {
                board: Board::EMPTY,
                current_turn: a,
            }),
            frame(&ServerMessage::MoveMade {
                board,
                position: 4,
                symbol: Symbol::O,
                next_turn: b,
                fade_position: None,
            }),
            None,
        ]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], GameEvent::Connected);
        assert!(matches!(seen[1], GameEvent::PlayerJoined { symbol: Symbol::X, .. }));
        assert!(matches!(seen[2], GameEvent::GameStart { current_turn, .. } if current_turn == a));
        assert!(matches!(seen[3], GameEvent::MoveMade { position: 4, .. }));
        assert_eq!(seen[4], GameEvent::Disconnected { reason: None });

        client.shutdown().await;
    }

    #[tokio::test]
    async fn undecodable_frames_are_skipped() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok("{\"type\":\"mystery\"}".into())),
            frame(&ServerMessage::PlayerLeft {
                player_id: Uuid::nil(),
            }),
        ]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::PlayerLeft {
                player_id: Uuid::nil()
            }
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn config_defaults_and_builders() {
        let config = ClientConfig::default();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let config = ClientConfig::new()
            .with_event_channel_capacity(0)
            .with_shutdown_timeout(Duration::from_millis(10))
            .with_request_timeout(Duration::from_millis(20));
        assert_eq!(config.event_channel_capacity, 1);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(10));
        assert_eq!(config.request_timeout, Duration::from_millis(20));
    }

    #[tokio::test]
    async fn small_event_channel_drops_events_but_keeps_disconnected() {
        let mut incoming = Vec::new();
        for _ in 0..20 {
            incoming.push(frame(&ServerMessage::PlayerLeft {
                player_id: Uuid::nil(),
            }));
        }
        incoming.push(None);
        let (transport, _sent, _closed) = MockTransport::new(incoming);

        let config = ClientConfig::new().with_event_channel_capacity(1);
        let (mut client, mut events) = GameClient::start(transport, config);

        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        assert!(seen.len() >= 2, "expected at least 2 events, got {}", seen.len());
        assert!(seen.len() < 22, "expected some events to be dropped");
        assert!(matches!(seen.last(), Some(GameEvent::Disconnected { .. })));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn disconnect_forgets_the_seat() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            frame(&ServerMessage::Welcome {
                connection_id: Uuid::from_u128(1),
            }),
            frame(&ServerMessage::Ack {
                request_id: 1,
                response: Ack::seated("ROOM01".into(), Symbol::O),
            }),
            None,
        ]);
        let (client, mut events) = GameClient::start(transport, ClientConfig::new());

        loop {
            match events.recv().await.unwrap() {
                GameEvent::Disconnected { .. } => break,
                _ => continue,
            }
        }
        assert!(!client.is_connected());
        assert_eq!(client.current_room_id().await, None);
        assert_eq!(client.symbol().await, None);
    }

    #[tokio::test]
    async fn transport_recv_error_emits_disconnected() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Err(
            GameError::TransportReceive("boom".into()),
        ))]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        match events.recv().await.unwrap() {
            GameEvent::Disconnected { reason } => assert!(reason.unwrap().contains("boom")),
            other => panic!("expected Disconnected, got {other:?}"),
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport_and_emits_disconnected() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);
        let (mut client, mut events) = GameClient::start(transport, ClientConfig::new());
        let _ = events.recv().await; // Connected

        client.shutdown().await;
        client.shutdown().await;

        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::Disconnected {
                reason: Some("client shut down".into())
            }
        );
        assert!(closed.load(Ordering::Relaxed));
        assert!(!client.is_connected());
    }

    /// Hangs forever in `close()` so the shutdown abort path runs.
    struct HangingCloseTransport {
        dropped: Arc<AtomicBool>,
    }

    impl Drop for HangingCloseTransport {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::Release);
        }
    }

    #[async_trait]
    impl Transport for HangingCloseTransport {
        async fn send(&mut self, _message: String) -> std::result::Result<(), GameError> {
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, GameError>> {
            std::future::pending().await
        }

        async fn close(&mut self) -> std::result::Result<(), GameError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_timeout_aborts_stuck_transport_task() {
        let dropped = Arc::new(AtomicBool::new(false));
        let transport = HangingCloseTransport {
            dropped: Arc::clone(&dropped),
        };
        let config = ClientConfig::new().with_shutdown_timeout(Duration::from_millis(20));
        let (mut client, mut events) = GameClient::start(transport, config);
        let _ = events.recv().await; // Connected

        client.shutdown().await;

        assert!(dropped.load(Ordering::Acquire));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);
        let (mut client, _events) = GameClient::start(transport, ClientConfig::new());

        let debug_str = format!("{client:?}");
        assert!(debug_str.contains("GameClient"));
        assert!(debug_str.contains("connected"));

        client.shutdown().await;
    }
}
