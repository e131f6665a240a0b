//! Error codes for structured failure responses.
//!
//! Codes serialize as `SCREAMING_SNAKE_CASE` strings (e.g. `"ROOM_NOT_FOUND"`)
//! and travel alongside the human-readable `message` of a failed acknowledgement
//! or an `error` server message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error codes sent by the game server.
///
/// Use [`description()`](ErrorCode::description) for a human-readable explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidInput,

    // Room errors
    RoomNotFound,
    RoomFull,
    PlayerNotFound,

    // Move errors
    InvalidMove,
    NotYourTurn,
    GameNotInProgress,

    // Server errors
    InternalError,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => {
                "The message could not be understood. Check that it is a well-formed request."
            }
            Self::RoomNotFound => {
                "The requested room could not be found. It may have closed or the code is incorrect."
            }
            Self::RoomFull => "The room already has two players. Try a different room.",
            Self::PlayerNotFound => {
                "You are not a player in this room. Join the room before acting in it."
            }
            Self::InvalidMove => {
                "That cell is off the board or already taken. Pick an empty cell from 0 to 8."
            }
            Self::NotYourTurn => "It is your opponent's turn. Wait for their move.",
            Self::GameNotInProgress => {
                "No game is running in this room. Wait for an opponent or restart the game."
            }
            Self::InternalError => "An internal server error occurred. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
