use super::orchestrator::{HybridOrchestrator, HybridStats};
use crate::{
    agent::{Agent, AgentError},
    candidate::MoveDecision,
    difficulty::Difficulty,
};
use async_trait::async_trait;
use gomoku_core::game::Game;
use std::{error::Error, sync::Arc};
use tracing::info;

pub struct HybridAgent {
    orchestrator: Arc<HybridOrchestrator>,
    difficulty: Difficulty,
}

impl HybridAgent {
    pub fn new(orchestrator: HybridOrchestrator, difficulty: Difficulty) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            difficulty,
        }
    }

    pub fn orchestrator(&self) -> &Arc<HybridOrchestrator> {
        &self.orchestrator
    }

    pub fn stats(&self) -> HybridStats {
        self.orchestrator.stats()
    }
}

#[async_trait]
impl Agent for HybridAgent {
    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!(from = %self.difficulty, to = %difficulty, "difficulty changed");
        self.difficulty = difficulty;
    }

    fn new_game(&mut self) {
        self.orchestrator.new_game();
    }

    async fn next_move(&mut self, game: &Game) -> Result<MoveDecision, Box<dyn Error + Send + Sync>> {
        if game.game_result().is_some() {
            return Err(AgentError::GameFinished.into());
        }
        if game.board().is_full() {
            return Err(AgentError::BoardFull.into());
        }

        Ok(self
            .orchestrator
            .decide(game.board(), game.history(), self.difficulty)
            .await)
    }
}
