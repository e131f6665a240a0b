//! # Fading Tic-Tac-Toe
//!
//! Authoritative server and async client for real-time, two-player
//! tic-tac-toe with the *fading moves* rule: each player keeps at most three
//! marks on the board, and placing a fourth erases their oldest.
//!
//! The server owns every room. Clients send room-scoped commands and observe
//! the match only through acknowledgements and room broadcasts, as JSON text
//! frames over any [`Transport`].
//!
//! ## Layers
//!
//! - [`board`]: the 3×3 grid and win/draw evaluation
//! - [`room`]: room state and the process-wide [`RoomStore`]
//! - [`engine`]: the match state machine, pure and synchronous
//! - [`protocol`]: wire types
//! - [`server`] / [`connection`]: the actor that routes commands and
//!   broadcasts, plus the per-connection pump
//! - [`client`] / [`event`] / [`view`]: the client SDK and its read-only
//!   match projection
//!
//! ## Features
//!
//! - `transport-websocket` (default): [`WebSocketTransport`] and
//!   [`server::serve`]
//! - `tokio-runtime`: the server actor and the client, without WebSocket
//! - `server` (default): the `fading-tictactoe-server` binary and [`logging`]

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod error_codes;
pub mod event;
pub mod protocol;
pub mod room;
pub mod transport;
pub mod transports;
pub mod view;

#[cfg(feature = "tokio-runtime")]
pub mod client;
#[cfg(feature = "tokio-runtime")]
pub mod connection;
#[cfg(feature = "tokio-runtime")]
pub mod server;

#[cfg(feature = "server")]
pub mod logging;

// Re-export primary types for ergonomic imports.
pub use board::{evaluate, Board, Outcome, Symbol};
pub use config::ServerConfig;
pub use engine::{Dispatch, MatchEngine, RoomEvent};
pub use error::{GameError, MatchError};
pub use error_codes::ErrorCode;
pub use event::GameEvent;
pub use protocol::{Ack, ClientRequest, Command, ServerMessage};
pub use room::{ConnectionId, Room, RoomId, RoomStore};
pub use transport::Transport;
pub use transports::LocalTransport;
pub use view::{MatchStatus, MatchView};

#[cfg(feature = "tokio-runtime")]
pub use client::{ClientConfig, GameClient};
#[cfg(feature = "tokio-runtime")]
pub use server::{GameServer, ServerHandle};

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
