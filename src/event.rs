//! Typed events emitted by [`GameClient`](crate::client::GameClient).
//!
//! Every [`ServerMessage`] maps to exactly one [`GameEvent`]. Two events are
//! synthetic: [`GameEvent::Connected`] is always first on the channel and
//! [`GameEvent::Disconnected`] always last.

use crate::board::{Board, Symbol};
use crate::error_codes::ErrorCode;
use crate::protocol::{Ack, ServerMessage};
use crate::room::ConnectionId;

/// Something that happened on a client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The transport loop started.
    Connected,

    /// The server assigned this connection its id.
    Welcome { connection_id: ConnectionId },

    /// A request was answered. The same acknowledgement also resolves the
    /// future returned by the client method that issued it.
    Acknowledged { request_id: u64, ack: Ack },

    PlayerJoined {
        player_id: ConnectionId,
        symbol: Symbol,
    },

    GameStart {
        board: Board,
        current_turn: ConnectionId,
    },

    MoveMade {
        board: Board,
        position: usize,
        symbol: Symbol,
        next_turn: ConnectionId,
        /// Cell that fades on the next mover's following move.
        fade_position: Option<usize>,
    },

    GameOver {
        board: Board,
        winner: Option<Symbol>,
        winning_line: Option<[usize; 3]>,
        draw: bool,
        opponent_left: bool,
    },

    GameRestart {
        board: Board,
        current_turn: ConnectionId,
    },

    PlayerLeft { player_id: ConnectionId },

    /// The server could not process a frame.
    ServerError {
        message: String,
        error_code: Option<ErrorCode>,
    },

    /// The connection ended. No further events follow.
    Disconnected { reason: Option<String> },
}

impl From<ServerMessage> for GameEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Welcome { connection_id } => Self::Welcome { connection_id },
            ServerMessage::Ack {
                request_id,
                response,
            } => Self::Acknowledged {
                request_id,
                ack: response,
            },
            ServerMessage::PlayerJoined { player_id, symbol } => {
                Self::PlayerJoined { player_id, symbol }
            }
            ServerMessage::GameStart {
                board,
                current_turn,
            } => Self::GameStart {
                board,
                current_turn,
            },
            ServerMessage::MoveMade {
                board,
                position,
                symbol,
                next_turn,
                fade_position,
            } => Self::MoveMade {
                board,
                position,
                symbol,
                next_turn,
                fade_position,
            },
            ServerMessage::GameOver {
                board,
                winner,
                winning_line,
                draw,
                opponent_left,
            } => Self::GameOver {
                board,
                winner,
                winning_line,
                draw: draw.unwrap_or(false),
                opponent_left: opponent_left.unwrap_or(false),
            },
            ServerMessage::GameRestart {
                board,
                current_turn,
            } => Self::GameRestart {
                board,
                current_turn,
            },
            ServerMessage::PlayerLeft { player_id } => Self::PlayerLeft { player_id },
            ServerMessage::Error {
                message,
                error_code,
            } => Self::ServerError {
                message,
                error_code,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn game_over_flags_default_to_false() {
        let event = GameEvent::from(ServerMessage::GameOver {
            board: Board::EMPTY,
            winner: Some(Symbol::O),
            winning_line: Some([0, 4, 8]),
            draw: None,
            opponent_left: None,
        });
        assert_eq!(
            event,
            GameEvent::GameOver {
                board: Board::EMPTY,
                winner: Some(Symbol::O),
                winning_line: Some([0, 4, 8]),
                draw: false,
                opponent_left: false,
            }
        );
    }

    #[test]
    fn ack_becomes_acknowledged() {
        let event = GameEvent::from(ServerMessage::Ack {
            request_id: 3,
            response: Ack::ok(),
        });
        assert_eq!(
            event,
            GameEvent::Acknowledged {
                request_id: 3,
                ack: Ack::ok()
            }
        );
    }

    #[test]
    fn error_becomes_server_error() {
        let id = Uuid::from_u128(1);
        assert_eq!(
            GameEvent::from(ServerMessage::PlayerLeft { player_id: id }),
            GameEvent::PlayerLeft { player_id: id }
        );
        assert!(matches!(
            GameEvent::from(ServerMessage::Error {
                message: "bad".into(),
                error_code: Some(ErrorCode::InvalidInput),
            }),
            GameEvent::ServerError {
                error_code: Some(ErrorCode::InvalidInput),
                ..
            }
        ));
    }
}
