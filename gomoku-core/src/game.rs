use crate::board::{Board, Cell, Position, BOARD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn name(self) -> &'static str {
        match self {
            Player::Black => "black",
            Player::White => "white",
        }
    }

    pub fn initial(self) -> char {
        match self {
            Player::Black => 'b',
            Player::White => 'w',
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::Black => 'X',
            Player::White => 'O',
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// The player to move after `ply` stones have been placed. Black moves first.
    pub fn to_move(ply: usize) -> Self {
        if ply % 2 == 0 {
            Player::Black
        } else {
            Player::White
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

/// A recorded stone placement. `ply` is the zero-based index in the game's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub position: Position,
    pub player: Player,
    pub ply: usize,
}

impl Move {
    pub fn new(position: Position, player: Player, ply: usize) -> Self {
        Self {
            position,
            player,
            ply,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameResult {
    Draw,
    Win(Player),
}

#[derive(Debug, Clone)]
pub struct Game {
    turn: Player,
    history: Vec<Move>,
    game_result: Option<GameResult>,
    board: Board,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(BOARD_SIZE)
    }
}

impl Game {
    pub fn new(board_size: usize) -> Self {
        Self {
            turn: Player::Black,
            history: vec![],
            game_result: None,
            board: Board::new(board_size),
        }
    }

    /// Replays a sequence of positions from an empty board, alternating colors from black.
    pub fn from_positions(
        board_size: usize,
        positions: impl IntoIterator<Item = Position>,
    ) -> Result<Self, PlaceStoneError> {
        let mut game = Self::new(board_size);
        for position in positions {
            game.place_stone(position)?;
        }
        Ok(game)
    }

    pub fn board_size(&self) -> usize {
        self.board.board_size()
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last()
    }

    pub fn game_result(&self) -> Option<GameResult> {
        self.game_result
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}

pub struct PlaceStoneResult {
    pub placed: Move,
    pub board_was: Board,
    /// The run lengths through the placed stone, longest first.
    pub consecutive_stones: Vec<usize>,
    pub game_result: Option<GameResult>,
}

#[derive(Error, Debug, Clone)]
pub enum PlaceStoneError {
    #[error("position {position} is outside the {board_size}x{board_size} board")]
    InvalidPosition {
        position: Position,
        board_size: usize,
    },
    #[error("stone already placed at {position}")]
    StoneAlreadyPlaced { position: Position, stone: Cell },
    #[error("the game is already finished")]
    GameFinished,
}

impl Game {
    pub fn place_stone(&mut self, position: Position) -> Result<PlaceStoneResult, PlaceStoneError> {
        if self.game_result.is_some() {
            return Err(PlaceStoneError::GameFinished);
        }

        let cell = match self.board.get(position) {
            Some(cell) => cell,
            None => {
                return Err(PlaceStoneError::InvalidPosition {
                    position,
                    board_size: self.board.board_size(),
                });
            }
        };

        if !cell.is_empty() {
            return Err(PlaceStoneError::StoneAlreadyPlaced {
                position,
                stone: cell,
            });
        }

        let board_was = self.board.clone();
        self.board.set(position, self.turn.into());

        let consecutive_stones = self.board.count_consecutive_cells(position, self.turn);
        let is_winning_move = self.board.is_winning_move(position, self.turn);

        let placed = Move::new(position, self.turn, self.history.len());
        self.history.push(placed);
        self.turn = self.turn.opponent();

        if is_winning_move {
            self.game_result = Some(GameResult::Win(placed.player));
        } else if self.board.is_full() {
            self.game_result = Some(GameResult::Draw);
        }

        Ok(PlaceStoneResult {
            placed,
            board_was,
            consecutive_stones,
            game_result: self.game_result,
        })
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "turn: {} ({:3})", self.turn.name(), self.turn_count() + 1)?;
        writeln!(
            f,
            "state: {}",
            match self.game_result {
                Some(GameResult::Win(player)) => format!("{} wins", player.name()),
                Some(GameResult::Draw) => "draw".to_string(),
                None => "in progress".to_string(),
            }
        )?;
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_stone_alternates_and_records_history() {
        let mut game = Game::default();
        game.place_stone(Position::new(7, 7)).unwrap();
        game.place_stone(Position::new(8, 8)).unwrap();

        assert_eq!(game.turn(), Player::Black);
        assert_eq!(
            game.history(),
            &[
                Move::new(Position::new(7, 7), Player::Black, 0),
                Move::new(Position::new(8, 8), Player::White, 1),
            ]
        );
        assert_eq!(game.board().get(Position::new(8, 8)), Some(Cell::White));
    }

    #[test]
    fn test_place_stone_rejects_occupied_and_outside() {
        let mut game = Game::default();
        game.place_stone(Position::new(7, 7)).unwrap();

        assert!(matches!(
            game.place_stone(Position::new(7, 7)),
            Err(PlaceStoneError::StoneAlreadyPlaced { .. })
        ));
        assert!(matches!(
            game.place_stone(Position::new(15, 0)),
            Err(PlaceStoneError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_five_in_a_row_wins() {
        // black plays along row 0, white along row 1
        let positions = (0..4)
            .flat_map(|x| [Position::new(x, 0), Position::new(x, 1)])
            .chain([Position::new(4, 0)]);
        let game = Game::from_positions(15, positions).unwrap();

        assert_eq!(game.game_result(), Some(GameResult::Win(Player::Black)));

        let mut game = game;
        assert!(matches!(
            game.place_stone(Position::new(9, 9)),
            Err(PlaceStoneError::GameFinished)
        ));
    }

    #[test]
    fn test_to_move() {
        assert_eq!(Player::to_move(0), Player::Black);
        assert_eq!(Player::to_move(7), Player::White);
    }
}
