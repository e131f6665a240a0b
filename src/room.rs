//! Room state and the process-wide room store.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::board::{Board, Symbol};

/// Unique identifier for a connection, assigned by the server on connect.
pub type ConnectionId = Uuid;

/// Short, human-shareable room code.
pub type RoomId = String;

/// Default number of characters in a generated room code.
pub const DEFAULT_ROOM_CODE_LENGTH: usize = 6;

/// Shortest room code a [`RoomStore`] will generate.
pub const MIN_ROOM_CODE_LENGTH: usize = 4;

/// Characters room codes are drawn from.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum number of players in a room.
pub const MAX_PLAYERS: usize = 2;

/// Number of marks a player keeps on the board; placing one more fades the oldest.
pub const VISIBLE_MARKS: usize = 3;

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub connection_id: ConnectionId,
    pub symbol: Symbol,
    /// Cells this player currently has on the board, oldest first.
    pub move_history: VecDeque<usize>,
}

impl Player {
    pub fn new(connection_id: ConnectionId, symbol: Symbol) -> Self {
        Self {
            connection_id,
            symbol,
            move_history: VecDeque::with_capacity(VISIBLE_MARKS + 1),
        }
    }

    /// The cell that will fade on this player's next move, if they are at capacity.
    pub fn next_fade(&self) -> Option<usize> {
        if self.move_history.len() == VISIBLE_MARKS {
            self.move_history.front().copied()
        } else {
            None
        }
    }
}

/// Where a room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    WaitingForOpponent,
    InProgress,
    Over,
}

/// A single match's authoritative state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub players: Vec<Player>,
    pub board: Board,
    pub current_turn: ConnectionId,
    pub game_over: bool,
    pub winner: Option<ConnectionId>,
}

impl Room {
    /// A fresh room with `creator` seated as `O` and holding the first turn.
    pub fn new(id: RoomId, creator: ConnectionId) -> Self {
        Self {
            id,
            players: vec![Player::new(creator, Symbol::O)],
            board: Board::EMPTY,
            current_turn: creator,
            game_over: false,
            winner: None,
        }
    }

    pub fn phase(&self) -> RoomPhase {
        if self.game_over {
            RoomPhase::Over
        } else if self.players.len() < MAX_PLAYERS {
            RoomPhase::WaitingForOpponent
        } else {
            RoomPhase::InProgress
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn player(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id == conn)
    }

    pub fn player_mut(&mut self, conn: ConnectionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.connection_id == conn)
    }

    /// The first player that is not `conn`.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id != conn)
    }

    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.player(conn).is_some()
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.players.iter().map(|p| p.connection_id).collect()
    }

    /// The symbol a newly seated player receives: `X`, unless the remaining
    /// player already holds it.
    pub fn open_symbol(&self) -> Symbol {
        match self.players.first() {
            Some(p) => p.symbol.opposite(),
            None => Symbol::X,
        }
    }

    /// Clear the board, both move histories and the result.
    pub fn reset_board(&mut self) {
        self.board = Board::EMPTY;
        self.game_over = false;
        self.winner = None;
        for player in &mut self.players {
            player.move_history.clear();
        }
    }
}

/// Produces candidate room codes.
pub type CodeGenerator = Box<dyn FnMut() -> RoomId + Send>;

/// A random room code of `length` characters from `A-Z0-9`.
pub fn random_room_code(length: usize) -> RoomId {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| ROOM_CODE_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Process-wide mapping of room id to room state.
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    generate: CodeGenerator,
}

impl RoomStore {
    /// A store generating random codes of [`DEFAULT_ROOM_CODE_LENGTH`] characters.
    pub fn new() -> Self {
        Self::with_code_length(DEFAULT_ROOM_CODE_LENGTH)
    }

    /// A store generating random codes of `length` characters, clamped to at
    /// least [`MIN_ROOM_CODE_LENGTH`].
    pub fn with_code_length(length: usize) -> Self {
        let length = length.max(MIN_ROOM_CODE_LENGTH);
        Self::with_generator(Box::new(move || random_room_code(length)))
    }

    /// A store drawing candidate codes from `generate`.
    pub fn with_generator(generate: CodeGenerator) -> Self {
        Self {
            rooms: HashMap::new(),
            generate,
        }
    }

    /// Allocate a new room for `creator` under a code no live room uses.
    pub fn create(&mut self, creator: ConnectionId) -> RoomId {
        let id = loop {
            let candidate = (self.generate)();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!(room_id = %candidate, "room code collision, regenerating");
        };
        self.rooms.insert(id.clone(), Room::new(id.clone(), creator));
        id
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn delete(&mut self, room_id: &str) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// The id of the room `conn` is seated in, if any.
    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.rooms
            .values()
            .find(|room| room.contains(conn))
            .map(|room| room.id.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RoomStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomStore")
            .field("rooms", &self.rooms)
            .finish_non_exhaustive()
    }
}
