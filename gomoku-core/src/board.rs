mod notation;

use crate::game::Player;
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, fmt::Display};

/// Side length of the standard gomoku board.
pub const BOARD_SIZE: usize = 15;

/// Number of stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

/// The four line directions: horizontal, vertical and both diagonals.
pub const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_black(self) -> bool {
        matches!(self, Cell::Black)
    }

    pub fn is_white(self) -> bool {
        matches!(self, Cell::White)
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Player::Black),
            Cell::White => Some(Player::White),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cell::Empty => "empty",
            Cell::Black => "black",
            Cell::White => "white",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Black => 'X',
            Cell::White => 'O',
        }
    }
}

/// A board coordinate. `x` is the column and `y` is the row, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, `max(|dx|, |dy|)`.
    pub fn distance(self, other: Position) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Returns the position shifted by `(dx, dy)` if it stays on a board of `size`.
    pub fn offset(self, dx: isize, dy: isize, size: usize) -> Option<Position> {
        let x = self.x as isize + dx;
        let y = self.y as isize + dy;

        if x < 0 || y < 0 || size as isize <= x || size as isize <= y {
            return None;
        }

        Some(Position::new(x as usize, y as usize))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    board_size: usize,
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_SIZE)
    }
}

impl Board {
    pub fn new(board_size: usize) -> Self {
        let cells = vec![Cell::Empty; board_size * board_size];
        Self { board_size, cells }
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn center(&self) -> Position {
        Position::new(self.board_size / 2, self.board_size / 2)
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.board_size && position.y < self.board_size
    }

    pub fn get(&self, position: Position) -> Option<Cell> {
        if !self.contains(position) {
            return None;
        }

        self.cells.get(self.index_of(position)).copied()
    }

    pub fn is_empty_at(&self, position: Position) -> bool {
        self.get(position).is_some_and(Cell::is_empty)
    }

    /// Writes a cell. Out-of-range positions are ignored.
    pub fn set(&mut self, position: Position, cell: Cell) {
        if self.contains(position) {
            let index = self.index_of(position);
            self.cells[index] = cell;
        }
    }

    /// Returns a copy of the board with `player`'s stone at `position`.
    pub fn with_stone(&self, position: Position, player: Player) -> Board {
        let mut board = self.clone();
        board.set(position, player.into());
        board
    }

    pub fn index_of(&self, position: Position) -> usize {
        position.y * self.board_size + position.x
    }

    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index % self.board_size, index / self.board_size)
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|index| self.position_of(index))
    }

    pub fn legal_moves(&self) -> Vec<Position> {
        self.positions()
            .filter(|&position| self.is_empty_at(position))
            .collect()
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.stone_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Whether any stone lies within Chebyshev distance `radius` of `position`.
    pub fn has_stone_within(&self, position: Position, radius: usize) -> bool {
        let radius = radius as isize;

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let stone = position
                    .offset(dx, dy, self.board_size)
                    .and_then(|neighbor| self.get(neighbor))
                    .is_some_and(|cell| !cell.is_empty());

                if stone {
                    return true;
                }
            }
        }

        false
    }

    /// Canonical encoding of every occupied cell in row-major order, e.g. `b7.7,w8.8`.
    ///
    /// Two boards holding the same stones always produce the same signature.
    pub fn signature(&self) -> String {
        self.positions()
            .filter_map(|position| {
                let player = self.get(position)?.player()?;
                Some(format!("{}{}.{}", player.initial(), position.x, position.y))
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses a human-typed coordinate into a board position.
    ///
    /// Accepted formats:
    /// - `H8`, `h 8`: column letter followed by a 1-based row
    /// - `8H`: 1-based row followed by a column letter
    /// - `7,7`: zero-based `x,y`, the format the engine reports moves in
    pub fn parse_position(&self, input: &str) -> Option<Position> {
        let position = notation::parse(input)?;

        if !self.contains(position) {
            return None;
        }

        Some(position)
    }

    /// Converts a position to `{column letter}{1-based row}`, e.g. `(7,7)` -> `H8`.
    pub fn position_to_notation(&self, position: Position) -> Option<String> {
        if !self.contains(position) {
            return None;
        }

        Some(notation::format(position))
    }
}

impl Display for Board {
    /// Renders the board with column letters and 1-based row numbers.
    ///
    ///    A B C
    ///  1 . . .
    ///  2 . X .
    ///  3 . . O
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut result = String::with_capacity(self.board_size * (self.board_size + 1) * 2);

        result.push_str("   ");
        for x in 0..self.board_size {
            result.push((b'A' + x as u8) as char);
            result.push(' ');
        }
        result.push('\n');

        for y in 0..self.board_size {
            result.push_str(&format!("{:2} ", y + 1));

            for x in 0..self.board_size {
                result.push(self.cells[y * self.board_size + x].symbol());
                result.push(' ');
            }
            if y < self.board_size - 1 {
                result.push('\n');
            }
        }

        write!(f, "{}", result)
    }
}

impl Board {
    /// Count the number of consecutive stones through `position` in all four directions.
    ///
    /// Returns the run lengths sorted in descending order. Runs of length one are dropped,
    /// so an isolated stone yields an empty vector, as does a cell not owned by `player`.
    pub fn count_consecutive_cells(&self, position: Position, player: Player) -> Vec<usize> {
        let cell = match self.get(position) {
            Some(cell) => cell,
            None => {
                return vec![];
            }
        };

        if cell != player.into() {
            return vec![];
        }

        let mut results = DIRECTIONS
            .iter()
            .map(|&(dx, dy)| {
                1 + self.count_consecutive_cells_in_direction(position, cell, dx, dy)
                    + self.count_consecutive_cells_in_direction(position, cell, -dx, -dy)
            })
            .collect::<Vec<_>>();

        results.sort_unstable_by_key(|&count| Reverse(count));

        while let Some(&count) = results.last() {
            if count < 2 {
                results.pop();
            } else {
                break;
            }
        }

        results
    }

    /// Whether the stone at `position` completes five or more in a row for `player`.
    pub fn is_winning_move(&self, position: Position, player: Player) -> bool {
        self.count_consecutive_cells(position, player)
            .first()
            .is_some_and(|&count| WIN_LENGTH <= count)
    }

    fn count_consecutive_cells_in_direction(
        &self,
        position: Position,
        cell: Cell,
        dx: isize,
        dy: isize,
    ) -> usize {
        let mut count = 0;
        let mut current = position;

        while let Some(next) = current.offset(dx, dy, self.board_size) {
            if self.get(next) != Some(cell) {
                return count;
            }

            count += 1;
            current = next;
        }

        count
    }
}
