//! The match state machine.
//!
//! [`MatchEngine`] owns the [`RoomStore`] and applies commands to it. Every
//! operation either fails without touching any room, or mutates exactly one
//! room and returns a [`Dispatch`]: the acknowledgement for the caller plus the
//! broadcasts for the affected room channels, in application order.
//!
//! The engine is synchronous and does no I/O; the transport layer decides how
//! acknowledgements and broadcasts reach connections.

use tracing::{debug, info};

use crate::board::{evaluate, Symbol, CELL_COUNT};
use crate::error::MatchError;
use crate::protocol::{Ack, Command, ServerMessage};
use crate::room::{ConnectionId, Player, RoomId, RoomPhase, RoomStore, VISIBLE_MARKS};

/// A message addressed to every subscriber of a room channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    pub room_id: RoomId,
    pub message: ServerMessage,
}

impl RoomEvent {
    fn new(room_id: &str, message: ServerMessage) -> Self {
        Self {
            room_id: room_id.to_string(),
            message,
        }
    }
}

/// Outcome of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Reply for the issuing connection.
    pub ack: Ack,
    /// Room the caller is now seated in, when the command seated it.
    pub joined: Option<RoomId>,
    /// Broadcasts, in the order they were produced.
    pub events: Vec<RoomEvent>,
}

impl Dispatch {
    fn reply(ack: Ack) -> Self {
        Self {
            ack,
            joined: None,
            events: Vec::new(),
        }
    }
}

/// Authoritative owner of every room.
#[derive(Debug, Default)]
pub struct MatchEngine {
    rooms: RoomStore,
}

impl MatchEngine {
    pub fn new(rooms: RoomStore) -> Self {
        Self { rooms }
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    /// Validate and apply `command` on behalf of `conn`.
    pub fn handle(&mut self, conn: ConnectionId, command: Command) -> Result<Dispatch, MatchError> {
        match command {
            Command::CreateRoom => Ok(self.create_room(conn)),
            Command::JoinRoom { room_id } => self.join_room(conn, &room_id),
            Command::MakeMove { room_id, position } => self.make_move(conn, &room_id, position),
            Command::GameRestart { room_id } => self.restart_game(conn, &room_id),
        }
    }

    /// Open a new room with `conn` seated as `O`.
    pub fn create_room(&mut self, conn: ConnectionId) -> Dispatch {
        let events = self.leave_current_room(conn);
        let room_id = self.rooms.create(conn);
        info!(room_id = %room_id, conn = %conn, "room created");

        Dispatch {
            ack: Ack::seated(room_id.clone(), Symbol::O),
            joined: Some(room_id),
            events,
        }
    }

    /// Seat `conn` in `room_id`.
    pub fn join_room(&mut self, conn: ConnectionId, room_id: &str) -> Result<Dispatch, MatchError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| MatchError::RoomNotFound {
                room_id: room_id.to_string(),
            })?;
        if room.contains(conn) {
            let symbol = room.player(conn).map_or_else(|| room.open_symbol(), |p| p.symbol);
            return Ok(Dispatch::reply(Ack::seated(room_id.to_string(), symbol)));
        }
        if room.is_full() {
            return Err(MatchError::RoomFull {
                room_id: room_id.to_string(),
            });
        }

        let mut events = self.leave_current_room(conn);

        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| MatchError::RoomNotFound {
                room_id: room_id.to_string(),
            })?;

        // A game that ended because the opponent left starts over for the newcomer.
        if room.game_over {
            room.reset_board();
            if let Some(first) = room.players.first() {
                room.current_turn = first.connection_id;
            }
        }

        let symbol = room.open_symbol();
        room.players.push(Player::new(conn, symbol));
        info!(room_id = %room_id, conn = %conn, %symbol, "player joined");

        events.push(RoomEvent::new(
            room_id,
            ServerMessage::PlayerJoined {
                player_id: conn,
                symbol,
            },
        ));
        if room.phase() == RoomPhase::InProgress {
            debug!(room_id = %room_id, current_turn = %room.current_turn, "game started");
            events.push(RoomEvent::new(
                room_id,
                ServerMessage::GameStart {
                    board: room.board,
                    current_turn: room.current_turn,
                },
            ));
        }

        Ok(Dispatch {
            ack: Ack::seated(room_id.to_string(), symbol),
            joined: Some(room_id.to_string()),
            events,
        })
    }

    /// Place `conn`'s mark on `position`, applying the fading rule.
    pub fn make_move(
        &mut self,
        conn: ConnectionId,
        room_id: &str,
        position: usize,
    ) -> Result<Dispatch, MatchError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| MatchError::RoomNotFound {
                room_id: room_id.to_string(),
            })?;
        if !room.contains(conn) {
            return Err(MatchError::PlayerNotFound);
        }
        if room.phase() != RoomPhase::InProgress {
            return Err(MatchError::GameNotInProgress);
        }
        if room.current_turn != conn {
            return Err(MatchError::NotYourTurn);
        }
        if position >= CELL_COUNT || !room.board.is_open(position) {
            return Err(MatchError::InvalidMove { position });
        }

        let opponent = room.opponent_of(conn).ok_or(MatchError::GameNotInProgress)?;
        let next_turn = opponent.connection_id;
        let fade_position = opponent.next_fade();

        let mut board = room.board;
        let player = room.player_mut(conn).ok_or(MatchError::PlayerNotFound)?;
        let symbol = player.symbol;
        board.set(position, Some(symbol));
        player.move_history.push_back(position);
        if player.move_history.len() > VISIBLE_MARKS {
            if let Some(faded) = player.move_history.pop_front() {
                debug!(room_id = %room_id, conn = %conn, faded, "oldest mark faded");
                board.set(faded, None);
            }
        }
        room.board = board;

        let outcome = evaluate(&room.board);
        if let Some(winner) = outcome.winner {
            room.game_over = true;
            room.winner = Some(conn);
            info!(room_id = %room_id, winner = %conn, %symbol, "game won");
            return Ok(Dispatch {
                ack: Ack::moved(room.board, true, false),
                joined: None,
                events: vec![RoomEvent::new(
                    room_id,
                    ServerMessage::GameOver {
                        board: room.board,
                        winner: Some(winner),
                        winning_line: outcome.line,
                        draw: None,
                        opponent_left: None,
                    },
                )],
            });
        }
        if outcome.draw {
            room.game_over = true;
            info!(room_id = %room_id, "game drawn");
            return Ok(Dispatch {
                ack: Ack::moved(room.board, true, true),
                joined: None,
                events: vec![RoomEvent::new(
                    room_id,
                    ServerMessage::GameOver {
                        board: room.board,
                        winner: None,
                        winning_line: None,
                        draw: Some(true),
                        opponent_left: None,
                    },
                )],
            });
        }

        room.current_turn = next_turn;
        debug!(room_id = %room_id, position, %symbol, next_turn = %next_turn, "move applied");
        Ok(Dispatch {
            ack: Ack::moved(room.board, false, false),
            joined: None,
            events: vec![RoomEvent::new(
                room_id,
                ServerMessage::MoveMade {
                    board: room.board,
                    position,
                    symbol,
                    next_turn,
                    fade_position,
                },
            )],
        })
    }

    /// Clear the board and hand the first move to the player after the
    /// previous turn holder.
    pub fn restart_game(&mut self, conn: ConnectionId, room_id: &str) -> Result<Dispatch, MatchError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| MatchError::RestartRoomNotFound {
                room_id: room_id.to_string(),
            })?;
        if !room.contains(conn) {
            return Err(MatchError::PlayerNotFound);
        }

        room.reset_board();
        let next_index = room
            .players
            .iter()
            .position(|p| p.connection_id == room.current_turn)
            .map_or(0, |i| (i + 1) % room.players.len());
        if let Some(first) = room.players.get(next_index) {
            room.current_turn = first.connection_id;
        }
        info!(room_id = %room_id, current_turn = %room.current_turn, "game restarted");

        Ok(Dispatch {
            ack: Ack::ok(),
            joined: None,
            events: vec![RoomEvent::new(
                room_id,
                ServerMessage::GameRestart {
                    board: room.board,
                    current_turn: room.current_turn,
                },
            )],
        })
    }

    /// Remove `conn` from every room it is seated in.
    ///
    /// Remaining members are told the player left. A room left with no one
    /// in it is deleted; a game still in progress ends with `opponentLeft`.
    pub fn handle_disconnect(&mut self, conn: ConnectionId) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        let affected: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|room| room.contains(conn))
            .map(|room| room.id.clone())
            .collect();

        for room_id in affected {
            let Some(room) = self.rooms.get_mut(&room_id) else {
                continue;
            };
            events.push(RoomEvent::new(
                &room_id,
                ServerMessage::PlayerLeft { player_id: conn },
            ));

            if room.players.len() <= 1 {
                self.rooms.delete(&room_id);
                info!(room_id = %room_id, "room deleted");
                continue;
            }

            room.players.retain(|p| p.connection_id != conn);
            if room.current_turn == conn {
                if let Some(remaining) = room.players.first() {
                    room.current_turn = remaining.connection_id;
                }
            }
            info!(room_id = %room_id, conn = %conn, "player left");

            if !room.game_over {
                room.game_over = true;
                events.push(RoomEvent::new(
                    &room_id,
                    ServerMessage::GameOver {
                        board: room.board,
                        winner: None,
                        winning_line: None,
                        draw: None,
                        opponent_left: Some(true),
                    },
                ));
            }
        }

        events
    }

    /// Run the departure logic for whatever room `conn` currently sits in.
    fn leave_current_room(&mut self, conn: ConnectionId) -> Vec<RoomEvent> {
        match self.rooms.room_of(conn) {
            Some(previous) => {
                debug!(room_id = %previous, conn = %conn, "leaving previous room");
                self.handle_disconnect(conn)
            }
            None => Vec::new(),
        }
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
    use crate::board::{Board, Symbol};
    use crate::error_codes::ErrorCode;
    use uuid::Uuid;

    struct Table {
        engine: MatchEngine,
        a: ConnectionId,
        b: ConnectionId,
        room: RoomId,
    }

    /// A creates a room (O), B joins (X).
    fn seated_table() -> Table {
        let mut engine = MatchEngine::default();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let room = engine.create_room(a).joined.unwrap();
        engine.join_room(b, &room).unwrap();
        Table { engine, a, b, room }
    }

    impl Table {
        fn play(&mut self, conn: ConnectionId, position: usize) -> Dispatch {
            self.engine.make_move(conn, &self.room, position).unwrap()
        }
    }

    fn room_board(t: &Table) -> Board {
        t.engine.rooms().get(&t.room).unwrap().board
    }

    #[test]
    fn create_room_acks_with_o() {
        let mut engine = MatchEngine::default();
        let dispatch = engine.create_room(Uuid::new_v4());
        assert!(dispatch.ack.success);
        assert_eq!(dispatch.ack.symbol, Some(Symbol::O));
        assert_eq!(dispatch.ack.room_id, dispatch.joined);
        assert!(dispatch.events.is_empty());
    }

    #[test]
    fn join_emits_player_joined_then_game_start() {
        let mut engine = MatchEngine::default();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let room = engine.create_room(a).joined.unwrap();

        let dispatch = engine.join_room(b, &room).unwrap();
        assert_eq!(dispatch.ack, Ack::seated(room.clone(), Symbol::X));
        assert_eq!(
            dispatch.events,
            vec![
                RoomEvent::new(
                    &room,
                    ServerMessage::PlayerJoined {
                        player_id: b,
                        symbol: Symbol::X
                    }
                ),
                RoomEvent::new(
                    &room,
                    ServerMessage::GameStart {
                        board: Board::EMPTY,
                        current_turn: a
                    }
                ),
            ]
        );
        assert_eq!(
            engine.rooms().get(&room).unwrap().phase(),
            RoomPhase::InProgress
        );
    }

    #[test]
    fn join_unknown_room_fails() {
        let mut engine = MatchEngine::default();
        let err = engine.join_room(Uuid::new_v4(), "NOPE00").unwrap_err();
        assert_eq!(err.code(), ErrorCode::RoomNotFound);
    }

    #[test]
    fn join_full_room_fails_without_mutation() {
        let mut t = seated_table();
        let before = t.engine.rooms().get(&t.room).unwrap().clone();

        let err = t.engine.join_room(Uuid::from_u128(3), &t.room).unwrap_err();
        assert_eq!(
            err,
            MatchError::RoomFull {
                room_id: t.room.clone()
            }
        );
        assert_eq!(t.engine.rooms().get(&t.room).unwrap(), &before);
    }

    #[test]
    fn first_move_broadcasts_board_and_next_turn() {
        let mut t = seated_table();
        let dispatch = t.play(t.a, 4);

        let mut expected = Board::EMPTY;
        expected.set(4, Some(Symbol::O));
        assert_eq!(dispatch.ack, Ack::moved(expected, false, false));
        assert_eq!(
            dispatch.events,
            vec![RoomEvent::new(
                &t.room,
                ServerMessage::MoveMade {
                    board: expected,
                    position: 4,
                    symbol: Symbol::O,
                    next_turn: t.b,
                    fade_position: None,
                }
            )]
        );
        assert_eq!(t.engine.rooms().get(&t.room).unwrap().current_turn, t.b);
    }

    #[test]
    fn turns_alternate() {
        let mut t = seated_table();
        let moves = [(t.a, 0), (t.b, 1), (t.a, 5), (t.b, 3), (t.a, 7)];
        for (conn, position) in moves {
            t.play(conn, position);
            let room = t.engine.rooms().get(&t.room).unwrap();
            let other = if conn == t.a { t.b } else { t.a };
            assert_eq!(room.current_turn, other);
        }
    }

    #[test]
    fn diagonal_win_with_three_marks() {
        let mut t = seated_table();
        t.play(t.a, 0);
        t.play(t.b, 1);
        t.play(t.a, 4);
        t.play(t.b, 2);
        let dispatch = t.play(t.a, 8);

        assert_eq!(dispatch.ack.game_over, Some(true));
        match &dispatch.events[..] {
            [RoomEvent {
                message:
                    ServerMessage::GameOver {
                        winner,
                        winning_line,
                        ..
                    },
                ..
            }] => {
                assert_eq!(*winner, Some(Symbol::O));
                assert_eq!(*winning_line, Some([0, 4, 8]));
            }
            other => panic!("expected a single gameOver, got {other:?}"),
        }
        let room = t.engine.rooms().get(&t.room).unwrap();
        assert!(room.game_over);
        assert_eq!(room.winner, Some(t.a));
        assert_eq!(room.phase(), RoomPhase::Over);

        let err = t.engine.make_move(t.b, &t.room, 3).unwrap_err();
        assert_eq!(err, MatchError::GameNotInProgress);
    }

    #[test]
    fn fourth_move_fades_the_first() {
        let mut t = seated_table();
        t.play(t.a, 0);
        t.play(t.b, 4);
        t.play(t.a, 1);
        t.play(t.b, 2);
        t.play(t.a, 6);
        t.play(t.b, 3);
        let dispatch = t.play(t.a, 5);

        match &dispatch.events[..] {
            [RoomEvent {
                message: ServerMessage::MoveMade { board, .. },
                ..
            }] => {
                assert_eq!(board.get(0), None, "first O mark should have faded");
                assert_eq!(board.get(5), Some(Symbol::O));
                assert_eq!(board.count(Symbol::O), 3);
            }
            other => panic!("expected moveMade, got {other:?}"),
        }
        let room = t.engine.rooms().get(&t.room).unwrap();
        let history: Vec<usize> = room.players[0].move_history.iter().copied().collect();
        assert_eq!(history, vec![1, 6, 5]);
    }

    #[test]
    fn fade_position_points_at_opponents_oldest_mark() {
        let mut t = seated_table();
        t.play(t.a, 0);
        t.play(t.b, 4);
        t.play(t.a, 1);
        t.play(t.b, 2);
        let dispatch = t.play(t.a, 6);
        // B has two marks: no hint yet.
        assert!(matches!(
            dispatch.events[0].message,
            ServerMessage::MoveMade {
                fade_position: None,
                ..
            }
        ));

        let dispatch = t.play(t.b, 3);
        // A has three marks: 0 fades on A's next move.
        assert!(matches!(
            dispatch.events[0].message,
            ServerMessage::MoveMade {
                fade_position: Some(0),
                ..
            }
        ));
        // The hint does not clear anything yet.
        assert_eq!(room_board(&t).get(0), Some(Symbol::O));
    }

    #[test]
    fn no_player_ever_shows_more_than_three_marks() {
        let mut t = seated_table();
        // Cycle through open cells, never completing a line for long games.
        let script = [
            (t.a, 0),
            (t.b, 1),
            (t.a, 2),
            (t.b, 4),
            (t.a, 3),
            (t.b, 5),
            (t.a, 7),
            (t.b, 6),
            (t.a, 1),
            (t.b, 8),
        ];
        for (conn, position) in script {
            let dispatch = t.engine.make_move(conn, &t.room, position);
            let board = room_board(&t);
            assert!(board.count(Symbol::O) <= 3);
            assert!(board.count(Symbol::X) <= 3);
            if dispatch.map(|d| d.ack.game_over == Some(true)).unwrap_or(false) {
                break;
            }
        }
    }

    #[test]
    fn move_validation_order() {
        let mut t = seated_table();
        let stranger = Uuid::from_u128(99);

        assert_eq!(
            t.engine.make_move(t.a, "MISSING", 0).unwrap_err().code(),
            ErrorCode::RoomNotFound
        );
        assert_eq!(
            t.engine.make_move(stranger, &t.room, 0).unwrap_err(),
            MatchError::PlayerNotFound
        );
        assert_eq!(
            t.engine.make_move(t.b, &t.room, 0).unwrap_err(),
            MatchError::NotYourTurn
        );
        assert_eq!(
            t.engine.make_move(t.a, &t.room, 9).unwrap_err(),
            MatchError::InvalidMove { position: 9 }
        );
        t.play(t.a, 4);
        assert_eq!(
            t.engine.make_move(t.b, &t.room, 4).unwrap_err(),
            MatchError::InvalidMove { position: 4 }
        );
        // Rejected moves leave the board untouched.
        assert_eq!(room_board(&t).count(Symbol::X), 0);
    }

    #[test]
    fn cannot_move_while_waiting_for_opponent() {
        let mut engine = MatchEngine::default();
        let a = Uuid::new_v4();
        let room = engine.create_room(a).joined.unwrap();
        assert_eq!(
            engine.make_move(a, &room, 0).unwrap_err(),
            MatchError::GameNotInProgress
        );
    }

    #[test]
    fn restart_alternates_first_mover() {
        let mut t = seated_table();
        let dispatch = t.engine.restart_game(t.a, &t.room).unwrap();
        assert_eq!(dispatch.ack, Ack::ok());
        assert_eq!(
            dispatch.events[0].message,
            ServerMessage::GameRestart {
                board: Board::EMPTY,
                current_turn: t.b
            }
        );

        t.engine.restart_game(t.b, &t.room).unwrap();
        assert_eq!(t.engine.rooms().get(&t.room).unwrap().current_turn, t.a);
    }

    #[test]
    fn restart_after_win_clears_state_and_histories() {
        let mut t = seated_table();
        t.play(t.a, 0);
        t.play(t.b, 3);
        t.play(t.a, 1);
        t.play(t.b, 4);
        t.play(t.a, 2);

        t.engine.restart_game(t.b, &t.room).unwrap();
        let room = t.engine.rooms().get(&t.room).unwrap();
        assert!(!room.game_over);
        assert_eq!(room.winner, None);
        assert_eq!(room.board, Board::EMPTY);
        assert!(room.players.iter().all(|p| p.move_history.is_empty()));
        // A held the turn when the game ended (win does not flip it), so B opens.
        assert_eq!(room.current_turn, t.b);
    }

    #[test]
    fn restart_failures() {
        let mut t = seated_table();
        let err = t.engine.restart_game(t.a, "MISSING").unwrap_err();
        let ack = Ack::from(&err);
        assert_eq!(ack.message.as_deref(), Some("Room not found"));
        assert_eq!(ack.error_code, Some(ErrorCode::RoomNotFound));
        assert_eq!(
            t.engine
                .restart_game(Uuid::from_u128(77), &t.room)
                .unwrap_err(),
            MatchError::PlayerNotFound
        );
    }

    #[test]
    fn disconnect_of_sole_player_deletes_room() {
        let mut engine = MatchEngine::default();
        let a = Uuid::new_v4();
        let room = engine.create_room(a).joined.unwrap();

        let events = engine.handle_disconnect(a);
        assert_eq!(
            events,
            vec![RoomEvent::new(
                &room,
                ServerMessage::PlayerLeft { player_id: a }
            )]
        );
        assert!(engine.rooms().get(&room).is_none());
    }

    #[test]
    fn disconnect_mid_game_ends_it_for_the_opponent() {
        let mut t = seated_table();
        t.play(t.a, 4);

        let events = t.engine.handle_disconnect(t.b);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].message,
            ServerMessage::PlayerLeft { player_id: t.b }
        );
        match &events[1].message {
            ServerMessage::GameOver {
                opponent_left,
                winner,
                ..
            } => {
                assert_eq!(*opponent_left, Some(true));
                assert_eq!(*winner, None);
            }
            other => panic!("expected gameOver, got {other:?}"),
        }

        let room = t.engine.rooms().get(&t.room).unwrap();
        assert_eq!(room.players.len(), 1);
        assert!(room.game_over);
        assert_eq!(room.winner, None);
        // B held the turn; it passes to A.
        assert_eq!(room.current_turn, t.a);
    }

    #[test]
    fn disconnect_after_game_over_only_reports_departure() {
        let mut t = seated_table();
        t.play(t.a, 0);
        t.play(t.b, 3);
        t.play(t.a, 1);
        t.play(t.b, 4);
        t.play(t.a, 2);

        let events = t.engine.handle_disconnect(t.a);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].message, ServerMessage::PlayerLeft { .. }));
    }

    #[test]
    fn disconnect_of_unknown_connection_is_a_no_op() {
        let mut t = seated_table();
        assert!(t.engine.handle_disconnect(Uuid::from_u128(55)).is_empty());
        assert_eq!(t.engine.rooms().len(), 1);
    }

    #[test]
    fn newcomer_after_departure_gets_fresh_game_and_free_symbol() {
        let mut t = seated_table();
        t.play(t.a, 4);
        // The creator (O) leaves; B (X) remains.
        t.engine.handle_disconnect(t.a);

        let c = Uuid::from_u128(3);
        let dispatch = t.engine.join_room(c, &t.room).unwrap();
        assert_eq!(dispatch.ack.symbol, Some(Symbol::O));
        assert_eq!(
            dispatch.events.last().unwrap().message,
            ServerMessage::GameStart {
                board: Board::EMPTY,
                current_turn: t.b
            }
        );
        let room = t.engine.rooms().get(&t.room).unwrap();
        assert_eq!(room.phase(), RoomPhase::InProgress);
    }

    #[test]
    fn creating_a_room_leaves_the_previous_one() {
        let mut t = seated_table();
        let dispatch = t.engine.create_room(t.b);

        assert_eq!(
            dispatch.events[0],
            RoomEvent::new(&t.room, ServerMessage::PlayerLeft { player_id: t.b })
        );
        let old = t.engine.rooms().get(&t.room).unwrap();
        assert_eq!(old.players.len(), 1);
        assert_eq!(t.engine.rooms().room_of(t.b), dispatch.joined);
    }

    #[test]
    fn rejoining_own_room_is_idempotent() {
        let mut t = seated_table();
        let dispatch = t.engine.join_room(t.b, &t.room).unwrap();
        assert_eq!(dispatch.ack.symbol, Some(Symbol::X));
        assert!(dispatch.events.is_empty());
        assert_eq!(t.engine.rooms().get(&t.room).unwrap().players.len(), 2);
    }

    #[test]
    fn handle_dispatches_commands() {
        let mut engine = MatchEngine::default();
        let a = Uuid::from_u128(1);
        let dispatch = engine.handle(a, Command::CreateRoom).unwrap();
        let room_id = dispatch.joined.unwrap();

        let err = engine
            .handle(
                a,
                Command::MakeMove {
                    room_id: room_id.clone(),
                    position: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err, MatchError::GameNotInProgress);

        let dispatch = engine.handle(a, Command::GameRestart { room_id }).unwrap();
        assert!(dispatch.ack.success);
    }
}
