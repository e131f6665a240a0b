//! Board representation and result evaluation.
//!
//! The board is a fixed 3×3 grid stored row-major:
//!
//! ```text
//! 0 | 1 | 2
//! ---------
//! 3 | 4 | 5
//! ---------
//! 6 | 7 | 8
//! ```
//!
//! On the wire a board is a JSON array of nine elements, each `"X"`, `"O"` or
//! `null`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// Every winning triple, in evaluation order: rows, then columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // top row
    [3, 4, 5], // middle row
    [6, 7, 8], // bottom row
    [0, 3, 6], // left column
    [1, 4, 7], // center column
    [2, 5, 8], // right column
    [0, 4, 8], // main diagonal
    [2, 4, 6], // anti-diagonal
];

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The opposing mark.
    pub fn opposite(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// A 9-cell tic-tac-toe grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Option<Symbol>; CELL_COUNT]);

impl Board {
    /// An empty board.
    pub const EMPTY: Board = Board([None; CELL_COUNT]);

    /// Build a board from raw cells.
    pub fn from_cells(cells: [Option<Symbol>; CELL_COUNT]) -> Self {
        Self(cells)
    }

    /// The mark at `cell`, or `None` when the cell is empty or out of range.
    pub fn get(&self, cell: usize) -> Option<Symbol> {
        self.0.get(cell).copied().flatten()
    }

    /// Returns `true` if `cell` is on the board and unoccupied.
    pub fn is_open(&self, cell: usize) -> bool {
        matches!(self.0.get(cell), Some(None))
    }

    /// Place (or clear, with `None`) a mark. Out-of-range cells are ignored.
    pub fn set(&mut self, cell: usize, mark: Option<Symbol>) {
        if let Some(slot) = self.0.get_mut(cell) {
            *slot = mark;
        }
    }

    /// Returns `true` if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Number of cells holding `symbol`.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.0.iter().filter(|c| **c == Some(symbol)).count()
    }

    /// Raw cells, row-major.
    pub fn cells(&self) -> &[Option<Symbol>; CELL_COUNT] {
        &self.0
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.0.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f, "---------")?;
            }
            let marks: Vec<String> = cells
                .iter()
                .map(|c| c.map_or_else(|| " ".to_string(), |s| s.to_string()))
                .collect();
            writeln!(f, "{}", marks.join(" | "))?;
        }
        Ok(())
    }
}

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Owner of the first completed triple, if any.
    pub winner: Option<Symbol>,
    /// The completed triple.
    pub line: Option<[usize; 3]>,
    /// No winner and every cell filled.
    pub draw: bool,
}

impl Outcome {
    /// Returns `true` if the board ends the game.
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.draw
    }
}

/// Evaluate `board` for a winner or a draw.
///
/// Triples are scanned in [`WINNING_LINES`] order and the first uniform,
/// non-empty one is reported. Fading is not considered; a draw is purely a
/// function of cell occupancy.
pub fn evaluate(board: &Board) -> Outcome {
    for line in WINNING_LINES {
        let [a, b, c] = line;
        if let Some(symbol) = board.get(a) {
            if board.get(b) == Some(symbol) && board.get(c) == Some(symbol) {
                return Outcome {
                    winner: Some(symbol),
                    line: Some(line),
                    draw: false,
                };
            }
        }
    }

    Outcome {
        winner: None,
        line: None,
        draw: board.is_full(),
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

    const X: Option<Symbol> = Some(Symbol::X);
    const O: Option<Symbol> = Some(Symbol::O);
    const E: Option<Symbol> = None;

    /// Reference check: some triple is uniform and non-empty.
    fn has_uniform_triple(board: &Board) -> bool {
        WINNING_LINES.iter().any(|[a, b, c]| {
            let cells = board.cells();
            cells[*a].is_some() && cells[*a] == cells[*b] && cells[*a] == cells[*c]
        })
    }

    fn board_from_index(mut n: u32) -> Board {
        let mut cells = [None; CELL_COUNT];
        for cell in &mut cells {
            *cell = match n % 3 {
                0 => None,
                1 => Some(Symbol::X),
                _ => Some(Symbol::O),
            };
            n /= 3;
        }
        Board::from_cells(cells)
    }

    #[test]
    fn empty_board_has_no_result() {
        let outcome = evaluate(&Board::EMPTY);
        assert_eq!(outcome, Outcome::default());
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn detects_each_line() {
        for line in WINNING_LINES {
            let mut board = Board::EMPTY;
            for cell in line {
                board.set(cell, O);
            }
            let outcome = evaluate(&board);
            assert_eq!(outcome.winner, Some(Symbol::O));
            assert_eq!(outcome.line, Some(line));
            assert!(!outcome.draw);
        }
    }

    #[test]
    fn rows_take_priority_over_columns() {
        let board = Board::from_cells([X, X, X, X, E, E, X, E, E]);
        assert_eq!(evaluate(&board).line, Some([0, 1, 2]));
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        let outcome = evaluate(&board);
        assert_eq!(outcome.winner, None);
        assert!(outcome.draw);
    }

    #[test]
    fn full_board_with_line_is_not_draw() {
        let board = Board::from_cells([X, X, X, O, O, X, X, O, O]);
        let outcome = evaluate(&board);
        assert_eq!(outcome.winner, Some(Symbol::X));
        assert!(!outcome.draw);
    }

    #[test]
    fn evaluate_agrees_with_reference_on_every_board() {
        for n in 0..3u32.pow(9) {
            let board = board_from_index(n);
            let outcome = evaluate(&board);
            assert_eq!(outcome.winner.is_some(), has_uniform_triple(&board), "{board}");
            assert_eq!(outcome.draw, !has_uniform_triple(&board) && board.is_full());
        }
    }

    #[test]
    fn board_serializes_as_nine_element_array() {
        let mut board = Board::EMPTY;
        board.set(4, O);
        board.set(0, X);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn set_ignores_out_of_range() {
        let mut board = Board::EMPTY;
        board.set(9, X);
        assert_eq!(board, Board::EMPTY);
        assert!(!board.is_open(9));
        assert!(board.is_open(8));
    }

    #[test]
    fn display_renders_grid() {
        let board = Board::from_cells([X, E, O, E, X, E, E, E, O]);
        let rendered = board.to_string();
        assert!(rendered.starts_with("X |   | O\n"));
        assert_eq!(rendered.lines().count(), 5);
    }
}
