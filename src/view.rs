//! Client-side, read-only projection of a match.
//!
//! [`MatchView`] folds the [`GameEvent`] stream into the state a game screen
//! needs: whose turn it is, the result, the winning line and which cell is
//! about to fade. It never decides anything the server has not already
//! announced.

use std::fmt;

use crate::board::{Board, Symbol, CELL_COUNT};
use crate::event::GameEvent;
use crate::room::{ConnectionId, RoomId};

/// A one-line summary of the match from this player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Not greeted by the server yet.
    Connecting,
    /// Connected but not seated in a room.
    Idle,
    WaitingForOpponent,
    YourTurn,
    OpponentsTurn,
    Won,
    Lost,
    Draw,
    OpponentLeft,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connecting => "Connecting to server...",
            Self::Idle => "Start or join a game",
            Self::WaitingForOpponent => "Waiting for opponent to join...",
            Self::YourTurn => "Your turn",
            Self::OpponentsTurn => "Opponent's turn",
            Self::Won => "You won!",
            Self::Lost => "You lost!",
            Self::Draw => "Game ended in a draw!",
            Self::OpponentLeft => "Opponent left the game",
        };
        f.write_str(text)
    }
}

/// What one client knows about its match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchView {
    pub my_id: Option<ConnectionId>,
    pub room_id: Option<RoomId>,
    pub symbol: Option<Symbol>,
    pub board: Board,
    pub current_turn: Option<ConnectionId>,
    pub game_started: bool,
    pub game_over: bool,
    pub winner: Option<Symbol>,
    pub winning_line: Option<[usize; 3]>,
    pub is_draw: bool,
    pub opponent_left: bool,
    /// Cell that fades on the next mover's following move.
    pub fade_index: Option<usize>,
    pub connected: bool,
}

impl MatchView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the view.
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Connected => self.connected = true,
            GameEvent::Welcome { connection_id } => self.my_id = Some(*connection_id),
            GameEvent::Acknowledged { ack, .. } => {
                if let (true, Some(room_id), Some(symbol)) = (ack.success, &ack.room_id, ack.symbol)
                {
                    if self.room_id.as_ref() == Some(room_id) {
                        // Re-seated in the same room; the match carries on.
                        self.symbol = Some(symbol);
                        return;
                    }
                    // Seated in a new room: start from a clean slate.
                    *self = Self {
                        my_id: self.my_id,
                        connected: self.connected,
                        room_id: Some(room_id.clone()),
                        symbol: Some(symbol),
                        ..Self::default()
                    };
                }
            }
            GameEvent::PlayerJoined { .. } => {}
            GameEvent::GameStart {
                board,
                current_turn,
            }
            | GameEvent::GameRestart {
                board,
                current_turn,
            } => {
                self.board = *board;
                self.current_turn = Some(*current_turn);
                self.game_started = true;
                self.game_over = false;
                self.winner = None;
                self.winning_line = None;
                self.is_draw = false;
                self.opponent_left = false;
                self.fade_index = None;
            }
            GameEvent::MoveMade {
                board,
                next_turn,
                fade_position,
                ..
            } => {
                self.board = *board;
                self.current_turn = Some(*next_turn);
                self.fade_index = *fade_position;
            }
            GameEvent::GameOver {
                board,
                winner,
                winning_line,
                draw,
                opponent_left,
            } => {
                self.board = *board;
                self.game_over = true;
                self.winner = *winner;
                self.winning_line = *winning_line;
                self.is_draw = *draw;
                self.opponent_left = *opponent_left;
                self.fade_index = None;
            }
            GameEvent::PlayerLeft { .. } | GameEvent::ServerError { .. } => {}
            GameEvent::Disconnected { .. } => {
                *self = Self::default();
            }
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.game_started
            && !self.game_over
            && self.my_id.is_some()
            && self.current_turn == self.my_id
    }

    /// `Some(true)` if this player won, `Some(false)` if the opponent did.
    pub fn did_i_win(&self) -> Option<bool> {
        self.winner.zip(self.symbol).map(|(w, mine)| w == mine)
    }

    /// Whether a move on `position` would pass the server's checks as far as
    /// this view can tell.
    pub fn can_move(&self, position: usize) -> bool {
        self.room_id.is_some()
            && self.is_my_turn()
            && position < CELL_COUNT
            && self.board.is_open(position)
    }

    pub fn status(&self) -> MatchStatus {
        if !self.connected || self.my_id.is_none() {
            return MatchStatus::Connecting;
        }
        if self.room_id.is_none() {
            return MatchStatus::Idle;
        }
        if self.game_over {
            if self.is_draw {
                return MatchStatus::Draw;
            }
            if self.opponent_left {
                return MatchStatus::OpponentLeft;
            }
            return match self.did_i_win() {
                Some(true) => MatchStatus::Won,
                _ => MatchStatus::Lost,
            };
        }
        if !self.game_started {
            return MatchStatus::WaitingForOpponent;
        }
        if self.is_my_turn() {
            MatchStatus::YourTurn
        } else {
            MatchStatus::OpponentsTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Ack;
    use uuid::Uuid;

    const ME: ConnectionId = Uuid::from_u128(1);
    const THEM: ConnectionId = Uuid::from_u128(2);

    fn seated(symbol: Symbol) -> MatchView {
        let mut view = MatchView::new();
        view.apply(&GameEvent::Connected);
        view.apply(&GameEvent::Welcome { connection_id: ME });
        view.apply(&GameEvent::Acknowledged {
            request_id: 1,
            ack: Ack::seated("ROOM01".into(), symbol),
        });
        view
    }

    #[test]
    fn status_before_and_after_seating() {
        let mut view = MatchView::new();
        assert_eq!(view.status(), MatchStatus::Connecting);
        view.apply(&GameEvent::Connected);
        view.apply(&GameEvent::Welcome { connection_id: ME });
        assert_eq!(view.status(), MatchStatus::Idle);

        let view = seated(Symbol::O);
        assert_eq!(view.status(), MatchStatus::WaitingForOpponent);
        assert_eq!(view.room_id.as_deref(), Some("ROOM01"));
        assert!(!view.is_my_turn());
    }

    #[test]
    fn turn_follows_game_start_and_moves() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::GameStart {
            board: Board::EMPTY,
            current_turn: ME,
        });
        assert!(view.is_my_turn());
        assert!(view.can_move(4));
        assert_eq!(view.status().to_string(), "Your turn");

        let mut board = Board::EMPTY;
        board.set(4, Some(Symbol::O));
        view.apply(&GameEvent::MoveMade {
            board,
            position: 4,
            symbol: Symbol::O,
            next_turn: THEM,
            fade_position: Some(0),
        });
        assert!(!view.is_my_turn());
        assert!(!view.can_move(0));
        assert_eq!(view.fade_index, Some(0));
        assert_eq!(view.status(), MatchStatus::OpponentsTurn);
    }

    #[test]
    fn can_move_rejects_taken_and_off_board_cells() {
        let mut view = seated(Symbol::X);
        let mut board = Board::EMPTY;
        board.set(2, Some(Symbol::O));
        view.apply(&GameEvent::MoveMade {
            board,
            position: 2,
            symbol: Symbol::O,
            next_turn: ME,
            fade_position: None,
        });
        view.game_started = true;
        assert!(view.can_move(3));
        assert!(!view.can_move(2));
        assert!(!view.can_move(9));
    }

    #[test]
    fn game_over_reports_result_from_my_symbol() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::GameStart {
            board: Board::EMPTY,
            current_turn: ME,
        });
        view.apply(&GameEvent::GameOver {
            board: Board::EMPTY,
            winner: Some(Symbol::O),
            winning_line: Some([0, 4, 8]),
            draw: false,
            opponent_left: false,
        });
        assert_eq!(view.did_i_win(), Some(true));
        assert_eq!(view.status(), MatchStatus::Won);
        assert_eq!(view.winning_line, Some([0, 4, 8]));
        assert!(!view.is_my_turn());

        let mut loser = seated(Symbol::X);
        loser.apply(&GameEvent::GameOver {
            board: Board::EMPTY,
            winner: Some(Symbol::O),
            winning_line: Some([0, 4, 8]),
            draw: false,
            opponent_left: false,
        });
        assert_eq!(loser.status(), MatchStatus::Lost);
    }

    #[test]
    fn opponent_leaving_and_restart() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::GameStart {
            board: Board::EMPTY,
            current_turn: THEM,
        });
        view.apply(&GameEvent::PlayerLeft { player_id: THEM });
        view.apply(&GameEvent::GameOver {
            board: Board::EMPTY,
            winner: None,
            winning_line: None,
            draw: false,
            opponent_left: true,
        });
        assert_eq!(view.status(), MatchStatus::OpponentLeft);
        assert_eq!(view.did_i_win(), None);

        view.apply(&GameEvent::GameRestart {
            board: Board::EMPTY,
            current_turn: ME,
        });
        assert!(!view.game_over);
        assert!(!view.opponent_left);
        assert_eq!(view.status(), MatchStatus::YourTurn);
    }

    #[test]
    fn failed_ack_does_not_unseat() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::Acknowledged {
            request_id: 2,
            ack: Ack::failure("Room is full", crate::error_codes::ErrorCode::RoomFull),
        });
        assert_eq!(view.room_id.as_deref(), Some("ROOM01"));
    }

    #[test]
    fn rejoining_same_room_keeps_the_match() {
        let mut view = seated(Symbol::O);
        let mut board = Board::EMPTY;
        board.set(0, Some(Symbol::X));
        view.apply(&GameEvent::GameStart {
            board,
            current_turn: ME,
        });
        assert_eq!(view.status(), MatchStatus::YourTurn);

        view.apply(&GameEvent::Acknowledged {
            request_id: 2,
            ack: Ack::seated("ROOM01".into(), Symbol::O),
        });
        assert_eq!(view.status(), MatchStatus::YourTurn);
        assert!(view.game_started);
        assert_eq!(view.board, board);
    }

    #[test]
    fn seating_in_another_room_starts_clean() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::GameStart {
            board: Board::EMPTY,
            current_turn: ME,
        });
        view.apply(&GameEvent::Acknowledged {
            request_id: 2,
            ack: Ack::seated("ROOM02".into(), Symbol::X),
        });
        assert_eq!(view.room_id.as_deref(), Some("ROOM02"));
        assert_eq!(view.symbol, Some(Symbol::X));
        assert!(!view.game_started);
        assert_eq!(view.status(), MatchStatus::WaitingForOpponent);
    }

    #[test]
    fn disconnect_resets_everything() {
        let mut view = seated(Symbol::O);
        view.apply(&GameEvent::Disconnected { reason: None });
        assert_eq!(view, MatchView::default());
    }
}
