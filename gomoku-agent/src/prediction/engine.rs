//! Speculative precomputation of the engine's replies to the opponent's likely next moves.

use super::cache::{CacheStats, PredictionCache};
use crate::{
    candidate::MoveDecision,
    difficulty::Difficulty,
    heuristic::{self, HeuristicEvaluator},
};
use async_trait::async_trait;
use gomoku_core::{
    board::{Board, Position},
    game::{Move, Player},
};
use parking_lot::Mutex;
use std::{
    ops::RangeInclusive,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Ply counts for which predictions are attempted.
pub const PREDICTION_PLIES: RangeInclusive<usize> = 6..=200;
/// How many nearby cells are scored when guessing the opponent's reply.
pub const SCORED_CELLS: usize = 20;
/// How many opponent replies are precomputed.
pub const PREDICTED_REPLIES: usize = 3;
const SEARCH_RADIUS: usize = 3;

/// Produces the engine's own reply for a hypothetical position.
#[async_trait]
pub trait ReplyPlanner: Send + Sync {
    async fn plan_reply(&self, board: Board, history: Vec<Move>, difficulty: Difficulty) -> MoveDecision;
}

#[derive(Debug)]
pub struct PredictiveEngine {
    evaluator: HeuristicEvaluator,
    cache: Mutex<PredictionCache<MoveDecision>>,
    busy: AtomicBool,
    epoch: AtomicU64,
}

/// Holds the single in-flight prediction slot; releases it on drop.
#[derive(Debug)]
pub struct PredictionTicket {
    engine: Arc<PredictiveEngine>,
}

impl Drop for PredictionTicket {
    fn drop(&mut self) {
        self.engine.busy.store(false, Ordering::Release);
    }
}

impl Default for PredictiveEngine {
    fn default() -> Self {
        Self::new(PredictionCache::default())
    }
}

impl PredictiveEngine {
    pub fn new(cache: PredictionCache<MoveDecision>) -> Self {
        Self {
            evaluator: HeuristicEvaluator::default(),
            cache: Mutex::new(cache),
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn lookup(&self, board: &Board) -> Option<MoveDecision> {
        self.cache.lock().get(board)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Drops every cached prediction. A prediction still running from before the reset keeps
    /// its slot until it finishes but can no longer write into the cache.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.cache.lock().clear();
    }

    /// Claims the in-flight slot, or returns `None` when a prediction is already running.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PredictionTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PredictionTicket {
                engine: Arc::clone(self),
            })
    }

    /// The opponent's most likely replies: the best scored of the first nearby empty cells.
    pub fn predict_replies(&self, board: &Board, player: Player) -> Vec<Position> {
        let mut scored = heuristic::candidate_positions(board, SEARCH_RADIUS)
            .into_iter()
            .take(SCORED_CELLS)
            .map(|position| {
                let score = self.evaluator.evaluate_position(board, position, player, 1.0);
                (position, score)
            })
            .collect::<Vec<_>>();

        scored.sort_by(|(_, lhs), (_, rhs)| f64::total_cmp(rhs, lhs));
        scored
            .into_iter()
            .take(PREDICTED_REPLIES)
            .map(|(position, _)| position)
            .collect()
    }

    /// Starts a background prediction for the position after `history`.
    ///
    /// Does nothing when the ply count is outside [`PREDICTION_PLIES`] or another prediction
    /// is already running. The returned handle may be dropped; the task keeps running.
    pub fn start(
        self: &Arc<Self>,
        planner: Arc<dyn ReplyPlanner>,
        board: Board,
        history: Vec<Move>,
        difficulty: Difficulty,
    ) -> Option<JoinHandle<()>> {
        if !PREDICTION_PLIES.contains(&history.len()) {
            return None;
        }

        let Some(ticket) = self.try_acquire() else {
            debug!("prediction already in flight, trigger dropped");
            return None;
        };

        let engine = Arc::clone(self);
        let epoch = self.epoch.load(Ordering::Acquire);

        Some(tokio::spawn(async move {
            let _ticket = ticket;
            engine.run(planner.as_ref(), epoch, board, history, difficulty).await;
        }))
    }

    async fn run(
        &self,
        planner: &dyn ReplyPlanner,
        epoch: u64,
        board: Board,
        history: Vec<Move>,
        difficulty: Difficulty,
    ) {
        let player = Player::to_move(history.len());
        let replies = self.predict_replies(&board, player);

        info!(
            ply = history.len(),
            replies = ?replies,
            "predicting replies in the background"
        );

        for reply in replies {
            let next_board = board.with_stone(reply, player);
            let mut next_history = history.clone();
            next_history.push(Move::new(reply, player, history.len()));

            let decision = planner
                .plan_reply(next_board.clone(), next_history, difficulty)
                .await;

            if self.epoch.load(Ordering::Acquire) != epoch {
                debug!("game reset during prediction, result discarded");
                return;
            }

            debug!(
                reply = %reply,
                answer = %decision.position,
                "prediction stored"
            );
            self.cache.lock().set(&next_board, decision);
        }
    }
}
