use crate::{candidate::MoveDecision, difficulty::Difficulty};
use async_trait::async_trait;
use gomoku_core::game::Game;
use std::error::Error;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("the game is already finished")]
    GameFinished,
    #[error("the board has no empty cell left")]
    BoardFull,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn difficulty(&self) -> Difficulty;
    fn set_difficulty(&mut self, difficulty: Difficulty);
    /// Clears every piece of per-game state.
    fn new_game(&mut self);
    async fn next_move(&mut self, game: &Game) -> Result<MoveDecision, Box<dyn Error + Send + Sync>>;
}
