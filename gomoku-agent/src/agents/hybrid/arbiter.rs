//! Checks remote suggestions against the board and merges them with the local candidate.

use crate::{
    advisory::RemoteSuggestion,
    candidate::{Candidate, CandidateKind, DecisionSource, MoveDecision},
};
use gomoku_core::board::{Board, Position};
use rand::Rng;
use thiserror::Error;

/// Local scores from here on pin the remote move close to the local one.
pub const NEAR_FORCED_THRESHOLD: f64 = 10_000.0;
pub const NEAR_FORCED_DISTANCE: usize = 2;
/// A remote move must have a stone within this distance unless the board is empty.
pub const SUPPORT_RADIUS: usize = 3;
pub const AGREEMENT_BONUS: f64 = 0.1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("({x},{y}) is off the board")]
    OutOfBounds { x: i64, y: i64 },
    #[error("{0} is occupied")]
    Occupied(Position),
    #[error("{0} is a corner")]
    Corner(Position),
    #[error("{position} is {distance} cells from the near-forced local move")]
    StraysFromForcedMove { position: Position, distance: usize },
    #[error("{0} has no stone within reach")]
    Isolated(Position),
}

/// A remote suggestion that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMove {
    pub candidate: Candidate,
    /// Other legal cells the advisor mentioned.
    pub alternatives: Vec<Position>,
}

fn to_position(board: &Board, x: i64, y: i64) -> Option<Position> {
    let x = usize::try_from(x).ok()?;
    let y = usize::try_from(y).ok()?;
    let position = Position::new(x, y);
    board.contains(position).then_some(position)
}

pub fn is_corner(board: &Board, position: Position) -> bool {
    let last = board.board_size() - 1;
    (position.x == 0 || position.x == last) && (position.y == 0 || position.y == last)
}

pub fn validate(
    board: &Board,
    local: &Candidate,
    suggestion: &RemoteSuggestion,
) -> Result<RemoteMove, Rejection> {
    let position = to_position(board, suggestion.x, suggestion.y).ok_or(Rejection::OutOfBounds {
        x: suggestion.x,
        y: suggestion.y,
    })?;

    if !board.is_empty_at(position) {
        return Err(Rejection::Occupied(position));
    }

    if is_corner(board, position) {
        return Err(Rejection::Corner(position));
    }

    if NEAR_FORCED_THRESHOLD <= local.score {
        let distance = position.distance(local.position);
        if NEAR_FORCED_DISTANCE < distance {
            return Err(Rejection::StraysFromForcedMove { position, distance });
        }
    }

    if !board.is_empty() && !board.has_stone_within(position, SUPPORT_RADIUS) {
        return Err(Rejection::Isolated(position));
    }

    let mut alternatives = Vec::new();
    for &(x, y) in &suggestion.alternatives {
        if let Some(alternative) = to_position(board, x, y) {
            if alternative != position && board.is_empty_at(alternative) && !alternatives.contains(&alternative) {
                alternatives.push(alternative);
            }
        }
    }

    Ok(RemoteMove {
        candidate: Candidate::new(
            position,
            0.0,
            CandidateKind::Remote,
            suggestion.reasoning.clone(),
            suggestion.confidence,
        ),
        alternatives,
    })
}

pub fn blend(local: &Candidate, remote: &RemoteMove, remote_weight: f64) -> MoveDecision {
    blend_with_rng(local, remote, remote_weight, &mut rand::thread_rng())
}

/// Agreement boosts the local candidate; otherwise the remote move wins with probability
/// `remote_weight`. The move not taken is kept as an alternative.
pub fn blend_with_rng<R: Rng>(
    local: &Candidate,
    remote: &RemoteMove,
    remote_weight: f64,
    rng: &mut R,
) -> MoveDecision {
    let suggested = &remote.candidate;

    if local.position == suggested.position {
        return MoveDecision {
            position: local.position,
            confidence: (local.confidence + AGREEMENT_BONUS).min(1.0),
            rationale: format!(
                "[{}] {} (remote concurs: {})",
                DecisionSource::Agreed.name(),
                local.rationale,
                suggested.rationale
            ),
            alternatives: remote.alternatives.clone(),
            source: DecisionSource::Agreed,
        };
    }

    if rng.gen_bool(remote_weight.clamp(0.0, 1.0)) {
        let mut alternatives = vec![local.position];
        alternatives.extend(
            remote
                .alternatives
                .iter()
                .copied()
                .filter(|&position| position != local.position),
        );

        MoveDecision {
            position: suggested.position,
            confidence: suggested.confidence,
            rationale: format!(
                "[{}] {} (alternative: local {} move at {})",
                DecisionSource::Remote.name(),
                suggested.rationale,
                local.kind,
                local.position
            ),
            alternatives,
            source: DecisionSource::Remote,
        }
    } else {
        MoveDecision {
            position: local.position,
            confidence: local.confidence,
            rationale: format!(
                "[{}] {} (alternative: remote move at {})",
                DecisionSource::LocalPrimary.name(),
                local.rationale,
                suggested.position
            ),
            alternatives: vec![suggested.position],
            source: DecisionSource::LocalPrimary,
        }
    }
}
