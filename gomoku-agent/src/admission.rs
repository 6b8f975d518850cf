//! Decides whether a remote consultation is worth its latency for the current turn.

use crate::{candidate::Candidate, difficulty::Difficulty};
use gomoku_core::{
    board::{Board, DIRECTIONS},
    game::Move,
};
use std::collections::VecDeque;
use tracing::debug;

/// Local score above which the move is treated as forced.
pub const FORCED_MOVE_THRESHOLD: f64 = 10_000.0;
pub const CONFIDENT_LOCAL: f64 = 0.95;
/// Plies covered by the opening book.
pub const OPENING_PLIES: usize = 10;
/// Fewer empty cells than this counts as an endgame.
pub const ENDGAME_EMPTY_CELLS: usize = 30;
pub const FAILURE_WINDOW: usize = 20;
pub const MAX_FAILURE_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatLevel {
    Simple,
    Medium,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    ForcedMove,
    ConfidentLocal,
    Opening,
    Endgame,
    SimplePosition,
    DifficultyDisablesRemote,
    UnstableRemote,
}

impl SkipReason {
    pub fn name(self) -> &'static str {
        match self {
            SkipReason::ForcedMove => "forced-move",
            SkipReason::ConfidentLocal => "confident-local",
            SkipReason::Opening => "opening",
            SkipReason::Endgame => "endgame",
            SkipReason::SimplePosition => "simple-position",
            SkipReason::DifficultyDisablesRemote => "difficulty-disables-remote",
            SkipReason::UnstableRemote => "unstable-remote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionStats {
    pub attempts: usize,
    pub failures: usize,
    pub failure_rate: f64,
}

/// Gate in front of remote calls, with a rolling record of recent call outcomes.
#[derive(Debug, Clone, Default)]
pub struct AdmissionPolicy {
    outcomes: VecDeque<bool>,
}

impl AdmissionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns why the remote call should be skipped, or `None` if it should be attempted.
    pub fn skip_reason(
        &self,
        board: &Board,
        history: &[Move],
        local: &Candidate,
        difficulty: Difficulty,
    ) -> Option<SkipReason> {
        let reason = if FORCED_MOVE_THRESHOLD <= local.score {
            SkipReason::ForcedMove
        } else if CONFIDENT_LOCAL <= local.confidence {
            SkipReason::ConfidentLocal
        } else if history.len() < OPENING_PLIES {
            SkipReason::Opening
        } else if board.empty_count() < ENDGAME_EMPTY_CELLS {
            SkipReason::Endgame
        } else if threat_level(board) == ThreatLevel::Simple {
            SkipReason::SimplePosition
        } else if !difficulty.profile().remote_enabled {
            SkipReason::DifficultyDisablesRemote
        } else if MAX_FAILURE_RATE < self.failure_rate() {
            SkipReason::UnstableRemote
        } else {
            return None;
        };

        debug!(reason = reason.name(), "remote consultation skipped");
        Some(reason)
    }

    pub fn should_skip_remote(
        &self,
        board: &Board,
        history: &[Move],
        local: &Candidate,
        difficulty: Difficulty,
    ) -> bool {
        self.skip_reason(board, history, local, difficulty).is_some()
    }

    pub fn record(&mut self, success: bool) {
        if FAILURE_WINDOW <= self.outcomes.len() {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    /// Fraction of failures among the last [`FAILURE_WINDOW`] attempts.
    pub fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }

        self.failures() as f64 / self.outcomes.len() as f64
    }

    pub fn reset(&mut self) {
        self.outcomes.clear();
    }

    pub fn stats(&self) -> AdmissionStats {
        AdmissionStats {
            attempts: self.outcomes.len(),
            failures: self.failures(),
            failure_rate: self.failure_rate(),
        }
    }

    fn failures(&self) -> usize {
        self.outcomes.iter().filter(|&&success| !success).count()
    }
}

/// Coarse complexity scan over maximal same-color runs in the four directions.
///
/// Any run of four or more is complex; more than two runs of three is medium.
pub fn threat_level(board: &Board) -> ThreatLevel {
    let mut threes = 0;

    for position in board.positions() {
        let Some(cell) = board.get(position).filter(|cell| !cell.is_empty()) else {
            continue;
        };

        for &(dx, dy) in &DIRECTIONS {
            // only count each run once, from its first stone
            let starts_run = position
                .offset(-dx, -dy, board.board_size())
                .and_then(|previous| board.get(previous))
                != Some(cell);
            if !starts_run {
                continue;
            }

            let mut length = 1;
            let mut current = position;
            while let Some(next) = current.offset(dx, dy, board.board_size()) {
                if board.get(next) != Some(cell) {
                    break;
                }
                length += 1;
                current = next;
            }

            if 4 <= length {
                return ThreatLevel::Complex;
            }
            if length == 3 {
                threes += 1;
            }
        }
    }

    if 2 < threes {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Simple
    }
}
