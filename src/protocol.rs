//! Wire protocol types.
//!
//! Every frame is a JSON text message. Client frames are [`ClientRequest`]s
//! wrapping a [`Command`]; server frames are [`ServerMessage`]s. Enums use the
//! adjacently tagged `{"type": ..., "data": ...}` layout with camelCase names:
//!
//! ```text
//! → {"requestId":7,"command":{"type":"makeMove","data":{"roomId":"K3Q9ZD","position":4}}}
//! ← {"type":"ack","data":{"requestId":7,"response":{"success":true,"board":[...]}}}
//! ← {"type":"moveMade","data":{"board":[...],"position":4,"symbol":"O","nextTurn":"…","fadePosition":null}}
//! ```

use serde::{Deserialize, Serialize};

use crate::board::{Board, Symbol};
use crate::error::MatchError;
use crate::error_codes::ErrorCode;
use crate::room::{ConnectionId, RoomId};

// ── Client → server ─────────────────────────────────────────────────

/// A room-scoped command issued by a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum Command {
    /// Create a new room with the caller seated as `O`.
    CreateRoom,
    /// Take the open seat in an existing room.
    JoinRoom { room_id: RoomId },
    /// Place the caller's mark on `position` (0..=8).
    MakeMove { room_id: RoomId, position: usize },
    /// Start a new game in the room.
    GameRestart { room_id: RoomId },
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::MakeMove { .. } => "makeMove",
            Self::GameRestart { .. } => "gameRestart",
        }
    }
}

/// A command plus the id the server echoes back in its acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    pub request_id: u64,
    pub command: Command,
}

// ── Acknowledgements ────────────────────────────────────────────────

/// Direct reply to the connection that issued a command.
///
/// Only the fields relevant to the command are present on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl Ack {
    /// A bare success.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Success for `createRoom` / `joinRoom`.
    pub fn seated(room_id: RoomId, symbol: Symbol) -> Self {
        Self {
            success: true,
            room_id: Some(room_id),
            symbol: Some(symbol),
            ..Self::default()
        }
    }

    /// Success for `makeMove`.
    pub fn moved(board: Board, game_over: bool, draw: bool) -> Self {
        Self {
            success: true,
            board: Some(board),
            game_over: game_over.then_some(true),
            draw: draw.then_some(true),
            ..Self::default()
        }
    }

    /// A failure carrying a message and error code.
    pub fn failure(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error_code: Some(error_code),
            ..Self::default()
        }
    }
}

impl From<&MatchError> for Ack {
    fn from(err: &MatchError) -> Self {
        Self::failure(err.to_string(), err.code())
    }
}

// ── Server → client ─────────────────────────────────────────────────

/// Message types sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection: the id the server knows it by.
    Welcome { connection_id: ConnectionId },
    /// Reply to a single [`ClientRequest`].
    Ack { request_id: u64, response: Ack },
    /// A player took a seat.
    PlayerJoined {
        player_id: ConnectionId,
        symbol: Symbol,
    },
    /// Both seats are filled and play begins.
    GameStart {
        board: Board,
        current_turn: ConnectionId,
    },
    /// A non-terminal move was applied.
    MoveMade {
        board: Board,
        position: usize,
        symbol: Symbol,
        next_turn: ConnectionId,
        /// Cell that fades on the next mover's following move, for highlighting.
        fade_position: Option<usize>,
    },
    /// The game ended by a win, a draw or a departure.
    GameOver {
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<Symbol>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winning_line: Option<[usize; 3]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        draw: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opponent_left: Option<bool>,
    },
    /// A new game started in the same room.
    GameRestart {
        board: Board,
        current_turn: ConnectionId,
    },
    /// A player's connection dropped.
    PlayerLeft { player_id: ConnectionId },
    /// A frame could not be processed.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
}

impl ServerMessage {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Ack { .. } => "ack",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::GameStart { .. } => "gameStart",
            Self::MoveMade { .. } => "moveMade",
            Self::GameOver { .. } => "gameOver",
            Self::GameRestart { .. } => "gameRestart",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn create_room_has_no_data() {
        let req = ClientRequest {
            request_id: 1,
            command: Command::CreateRoom,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"requestId": 1, "command": {"type": "createRoom"}})
        );
    }

    #[test]
    fn make_move_parses_from_client_json() {
        let raw = r#"{"requestId":9,"command":{"type":"makeMove","data":{"roomId":"K3Q9ZD","position":4}}}"#;
        let req: ClientRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.request_id, 9);
        assert_eq!(
            req.command,
            Command::MakeMove {
                room_id: "K3Q9ZD".into(),
                position: 4
            }
        );
    }

    #[test]
    fn negative_position_is_rejected_by_parser() {
        let raw = r#"{"requestId":1,"command":{"type":"makeMove","data":{"roomId":"A","position":-1}}}"#;
        assert!(serde_json::from_str::<ClientRequest>(raw).is_err());
    }

    #[test]
    fn failure_ack_omits_success_only_fields() {
        let ack = Ack::from(&MatchError::RoomFull {
            room_id: "ABC".into(),
        });
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "message": "Room is full", "errorCode": "ROOM_FULL"})
        );
    }

    #[test]
    fn moved_ack_only_flags_terminal_states() {
        let value = serde_json::to_value(Ack::moved(Board::EMPTY, false, false)).unwrap();
        assert!(value.get("gameOver").is_none());
        assert!(value.get("draw").is_none());

        let value = serde_json::to_value(Ack::moved(Board::EMPTY, true, true)).unwrap();
        assert_eq!(value["gameOver"], json!(true));
        assert_eq!(value["draw"], json!(true));
    }

    #[test]
    fn move_made_uses_camel_case_and_null_fade() {
        let next = Uuid::from_u128(7);
        let msg = ServerMessage::MoveMade {
            board: Board::EMPTY,
            position: 4,
            symbol: Symbol::O,
            next_turn: next,
            fade_position: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!("moveMade"));
        assert_eq!(value["data"]["nextTurn"], json!(next.to_string()));
        assert_eq!(value["data"]["fadePosition"], json!(null));
        assert_eq!(value["data"]["symbol"], json!("O"));
    }

    #[test]
    fn opponent_left_game_over_omits_winner() {
        let msg = ServerMessage::GameOver {
            board: Board::EMPTY,
            winner: None,
            winning_line: None,
            draw: None,
            opponent_left: Some(true),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value["data"],
            json!({"board": [null, null, null, null, null, null, null, null, null], "opponentLeft": true})
        );
        let back: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn ack_message_layout() {
        let msg = ServerMessage::Ack {
            request_id: 3,
            response: Ack::seated("ROOM01".into(), Symbol::X),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"type": "ack", "data": {"requestId": 3, "response": {"success": true, "roomId": "ROOM01", "symbol": "X"}}})
        );
    }

    #[test]
    fn unknown_command_type_fails() {
        let raw = r#"{"requestId":1,"command":{"type":"leaveRoom"}}"#;
        assert!(serde_json::from_str::<ClientRequest>(raw).is_err());
    }
}
