#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests.
//!
//! Pins the JSON every frame type produces and accepts, so that non-Rust
//! clients can rely on it: adjacently tagged `{"type", "data"}` envelopes,
//! camelCase field names, 9-element boards with `null` for empty cells and
//! SCREAMING_SNAKE_CASE error codes.

use fading_tictactoe::protocol::{Ack, ClientRequest, Command, ServerMessage};
use fading_tictactoe::{Board, ErrorCode, MatchError, Symbol};
use serde_json::{json, Value};
use uuid::Uuid;

fn to_value(msg: &ServerMessage) -> Value {
    serde_json::to_value(msg).unwrap()
}

fn board_with(cells: &[(usize, Symbol)]) -> Board {
    let mut board = Board::EMPTY;
    for &(cell, symbol) in cells {
        board.set(cell, Some(symbol));
    }
    board
}

// ════════════════════════════════════════════════════════════════════
// Client → server
// ════════════════════════════════════════════════════════════════════

#[test]
fn every_command_parses_from_client_json() {
    let fixtures = [
        (
            json!({"requestId": 1, "command": {"type": "createRoom"}}),
            Command::CreateRoom,
        ),
        (
            json!({"requestId": 2, "command": {"type": "joinRoom", "data": {"roomId": "ABC123"}}}),
            Command::JoinRoom {
                room_id: "ABC123".into(),
            },
        ),
        (
            json!({"requestId": 3, "command": {"type": "makeMove", "data": {"roomId": "ABC123", "position": 8}}}),
            Command::MakeMove {
                room_id: "ABC123".into(),
                position: 8,
            },
        ),
        (
            json!({"requestId": 4, "command": {"type": "gameRestart", "data": {"roomId": "ABC123"}}}),
            Command::GameRestart {
                room_id: "ABC123".into(),
            },
        ),
    ];

    for (i, (raw, expected)) in fixtures.into_iter().enumerate() {
        let request: ClientRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.request_id, i as u64 + 1);
        assert_eq!(request.command, expected);
    }
}

#[test]
fn malformed_requests_are_rejected() {
    let bad = [
        json!({"command": {"type": "createRoom"}}),
        json!({"requestId": 1, "command": {"type": "joinRoom"}}),
        json!({"requestId": 1, "command": {"type": "makeMove", "data": {"roomId": "A"}}}),
        json!({"requestId": 1, "command": {"type": "makeMove", "data": {"roomId": "A", "position": "4"}}}),
        json!({"requestId": 1, "command": {"type": "join_room", "data": {"roomId": "A"}}}),
        json!({"requestId": -1, "command": {"type": "createRoom"}}),
    ];
    for raw in bad {
        assert!(
            serde_json::from_value::<ClientRequest>(raw.clone()).is_err(),
            "accepted {raw}"
        );
    }
}

#[test]
fn out_of_range_position_still_parses() {
    // Range is a rule check, answered with INVALID_MOVE, not a parse error.
    let raw = json!({"requestId": 1, "command": {"type": "makeMove", "data": {"roomId": "A", "position": 42}}});
    let request: ClientRequest = serde_json::from_value(raw).unwrap();
    assert!(matches!(request.command, Command::MakeMove { position: 42, .. }));
}

// ════════════════════════════════════════════════════════════════════
// Acknowledgements
// ════════════════════════════════════════════════════════════════════

#[test]
fn seated_ack_fixture() {
    let msg = ServerMessage::Ack {
        request_id: 1,
        response: Ack::seated("K3Q9ZD".into(), Symbol::O),
    };
    assert_eq!(
        to_value(&msg),
        json!({"type": "ack", "data": {"requestId": 1, "response": {"success": true, "roomId": "K3Q9ZD", "symbol": "O"}}})
    );
}

#[test]
fn move_ack_fixture() {
    let board = board_with(&[(4, Symbol::O)]);
    let value = serde_json::to_value(Ack::moved(board, false, false)).unwrap();
    assert_eq!(
        value,
        json!({"success": true, "board": [null, null, null, null, "O", null, null, null, null]})
    );

    let value = serde_json::to_value(Ack::moved(board, true, false)).unwrap();
    assert_eq!(value["gameOver"], json!(true));
    assert!(value.get("draw").is_none());
}

#[test]
fn failure_acks_carry_message_and_code() {
    let cases = [
        (
            MatchError::RoomNotFound {
                room_id: "ZZZZZZ".into(),
            },
            "room not found",
            "ROOM_NOT_FOUND",
        ),
        (
            MatchError::RestartRoomNotFound {
                room_id: "ZZZZZZ".into(),
            },
            "Room not found",
            "ROOM_NOT_FOUND",
        ),
        (
            MatchError::RoomFull {
                room_id: "ZZZZZZ".into(),
            },
            "Room is full",
            "ROOM_FULL",
        ),
        (MatchError::PlayerNotFound, "player not found", "PLAYER_NOT_FOUND"),
        (MatchError::NotYourTurn, "not your turn", "NOT_YOUR_TURN"),
        (
            MatchError::GameNotInProgress,
            "game is not in progress",
            "GAME_NOT_IN_PROGRESS",
        ),
        (
            MatchError::InvalidMove { position: 4 },
            "invalid move: cell 4 is not an open cell",
            "INVALID_MOVE",
        ),
    ];
    for (err, message, code) in cases {
        let value = serde_json::to_value(Ack::from(&err)).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "message": message, "errorCode": code})
        );
    }
}

#[test]
fn bare_success_ack_is_minimal() {
    assert_eq!(
        serde_json::to_value(Ack::ok()).unwrap(),
        json!({"success": true})
    );
}

// ════════════════════════════════════════════════════════════════════
// Broadcasts
// ════════════════════════════════════════════════════════════════════

#[test]
fn welcome_fixture() {
    let id = Uuid::from_u128(0xA);
    assert_eq!(
        to_value(&ServerMessage::Welcome { connection_id: id }),
        json!({"type": "welcome", "data": {"connectionId": id.to_string()}})
    );
}

#[test]
fn player_joined_and_left_fixtures() {
    let id = Uuid::from_u128(0xB);
    assert_eq!(
        to_value(&ServerMessage::PlayerJoined {
            player_id: id,
            symbol: Symbol::X
        }),
        json!({"type": "playerJoined", "data": {"playerId": id.to_string(), "symbol": "X"}})
    );
    assert_eq!(
        to_value(&ServerMessage::PlayerLeft { player_id: id }),
        json!({"type": "playerLeft", "data": {"playerId": id.to_string()}})
    );
}

#[test]
fn game_start_and_restart_fixtures() {
    let id = Uuid::from_u128(0xC);
    let empty = json!([null, null, null, null, null, null, null, null, null]);
    assert_eq!(
        to_value(&ServerMessage::GameStart {
            board: Board::EMPTY,
            current_turn: id
        }),
        json!({"type": "gameStart", "data": {"board": empty, "currentTurn": id.to_string()}})
    );
    assert_eq!(
        to_value(&ServerMessage::GameRestart {
            board: Board::EMPTY,
            current_turn: id
        }),
        json!({"type": "gameRestart", "data": {"board": empty, "currentTurn": id.to_string()}})
    );
}

#[test]
fn move_made_fixture_with_fade_hint() {
    let next = Uuid::from_u128(0xD);
    let board = board_with(&[(0, Symbol::O), (1, Symbol::X), (4, Symbol::O)]);
    let msg = ServerMessage::MoveMade {
        board,
        position: 4,
        symbol: Symbol::O,
        next_turn: next,
        fade_position: Some(1),
    };
    assert_eq!(
        to_value(&msg),
        json!({
            "type": "moveMade",
            "data": {
                "board": ["O", "X", null, null, "O", null, null, null, null],
                "position": 4,
                "symbol": "O",
                "nextTurn": next.to_string(),
                "fadePosition": 1
            }
        })
    );
}

#[test]
fn game_over_win_fixture() {
    let board = board_with(&[(0, Symbol::O), (4, Symbol::O), (8, Symbol::O), (1, Symbol::X)]);
    let msg = ServerMessage::GameOver {
        board,
        winner: Some(Symbol::O),
        winning_line: Some([0, 4, 8]),
        draw: None,
        opponent_left: None,
    };
    assert_eq!(
        to_value(&msg),
        json!({
            "type": "gameOver",
            "data": {
                "board": ["O", "X", null, null, "O", null, null, null, "O"],
                "winner": "O",
                "winningLine": [0, 4, 8]
            }
        })
    );
}

#[test]
fn game_over_parses_with_only_board() {
    let raw = json!({"type": "gameOver", "data": {"board": [null, null, null, null, null, null, null, null, null], "draw": true}});
    let msg: ServerMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(
        msg,
        ServerMessage::GameOver {
            board: Board::EMPTY,
            winner: None,
            winning_line: None,
            draw: Some(true),
            opponent_left: None,
        }
    );
}

#[test]
fn error_frame_fixture() {
    let msg = ServerMessage::Error {
        message: "malformed request: expected value".into(),
        error_code: Some(ErrorCode::InvalidInput),
    };
    assert_eq!(
        to_value(&msg),
        json!({"type": "error", "data": {"message": "malformed request: expected value", "errorCode": "INVALID_INPUT"}})
    );
}

#[test]
fn board_must_have_nine_cells() {
    let short = json!({"type": "gameStart", "data": {"board": [null, null], "currentTurn": Uuid::nil().to_string()}});
    assert!(serde_json::from_value::<ServerMessage>(short).is_err());

    let bad_mark = json!(["Z", null, null, null, null, null, null, null, null]);
    assert!(serde_json::from_value::<Board>(bad_mark).is_err());
}

#[test]
fn message_names_match_wire_tags() {
    let id = Uuid::nil();
    let messages = [
        ServerMessage::Welcome { connection_id: id },
        ServerMessage::Ack {
            request_id: 1,
            response: Ack::ok(),
        },
        ServerMessage::PlayerJoined {
            player_id: id,
            symbol: Symbol::O,
        },
        ServerMessage::GameStart {
            board: Board::EMPTY,
            current_turn: id,
        },
        ServerMessage::MoveMade {
            board: Board::EMPTY,
            position: 0,
            symbol: Symbol::O,
            next_turn: id,
            fade_position: None,
        },
        ServerMessage::GameOver {
            board: Board::EMPTY,
            winner: None,
            winning_line: None,
            draw: Some(true),
            opponent_left: None,
        },
        ServerMessage::GameRestart {
            board: Board::EMPTY,
            current_turn: id,
        },
        ServerMessage::PlayerLeft { player_id: id },
        ServerMessage::Error {
            message: String::new(),
            error_code: None,
        },
    ];
    for msg in &messages {
        assert_eq!(to_value(msg)["type"], json!(msg.name()));
    }

    let commands = [
        Command::CreateRoom,
        Command::JoinRoom {
            room_id: "A".into(),
        },
        Command::MakeMove {
            room_id: "A".into(),
            position: 0,
        },
        Command::GameRestart {
            room_id: "A".into(),
        },
    ];
    for command in &commands {
        assert_eq!(serde_json::to_value(command).unwrap()["type"], json!(command.name()));
    }
}
