//! Error types for the game server and client.

use thiserror::Error;

use crate::error_codes::ErrorCode;
use crate::room::RoomId;

/// Rule and lookup failures reported by the match engine.
///
/// These are always local to the caller: they are sent back as a failed
/// acknowledgement and never broadcast or applied to the room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No live room has this id.
    #[error("room not found")]
    RoomNotFound { room_id: RoomId },

    /// `gameRestart` named a room that does not exist.
    #[error("Room not found")]
    RestartRoomNotFound { room_id: RoomId },

    /// The room already holds two players.
    #[error("Room is full")]
    RoomFull { room_id: RoomId },

    /// The caller is not a player in the room.
    #[error("player not found")]
    PlayerNotFound,

    /// The target cell is off the board or occupied.
    #[error("invalid move: cell {position} is not an open cell")]
    InvalidMove { position: usize },

    /// The caller does not hold the current turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The room is waiting for an opponent or the game has ended.
    #[error("game is not in progress")]
    GameNotInProgress,
}

impl MatchError {
    /// The wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound { .. } | Self::RestartRoomNotFound { .. } => {
                ErrorCode::RoomNotFound
            }
            Self::RoomFull { .. } => ErrorCode::RoomFull,
            Self::PlayerNotFound => ErrorCode::PlayerNotFound,
            Self::InvalidMove { .. } => ErrorCode::InvalidMove,
            Self::NotYourTurn => ErrorCode::NotYourTurn,
            Self::GameNotInProgress => ErrorCode::GameNotInProgress,
        }
    }
}

/// Errors that can occur on the transport side of the server or client.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// The connection dropped before the operation could complete.
    #[error("disconnected from server")]
    TransportDisconnected,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server actor has shut down.
    #[error("game server unavailable")]
    ServerUnavailable,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for transport-side operations.
pub type Result<T> = std::result::Result<T, GameError>;
