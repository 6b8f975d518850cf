//! Single-ply pattern-scoring move evaluator.
//!
//! The evaluator is deterministic for a given board, player and difficulty except for the
//! optional random substitution at the lowest tier, which draws from the supplied RNG.

pub mod patterns;

use crate::{
    candidate::{Candidate, CandidateKind},
    difficulty::Difficulty,
};
use gomoku_core::{
    board::{Board, Cell, Position, BOARD_SIZE, DIRECTIONS},
    game::Player,
};
use patterns::{LineWindow, BLOCKED, EMPTY, OWN, WINDOW_LEN, WINDOW_RADIUS};
use rand::{seq::SliceRandom, Rng};

/// Radius around existing stones searched for candidate cells.
pub const CANDIDATE_RADIUS: usize = 2;

const OFFENSE_WEIGHT: f64 = 1.5;
const DEFENSE_WEIGHT: f64 = 1.2;
const CONNECTIVITY_WEIGHT: f64 = 5.0;
const POSITION_WEIGHT: f64 = 10.0;

/// How many of the first candidates a random substitution may pick from.
const RANDOM_POOL: usize = 5;

#[derive(Debug, Clone)]
pub struct HeuristicEvaluator {
    board_size: usize,
    position_weights: Vec<f64>,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new(BOARD_SIZE)
    }
}

impl HeuristicEvaluator {
    pub fn new(board_size: usize) -> Self {
        let center = board_size / 2;
        let position_weights = (0..board_size * board_size)
            .map(|index| {
                let distance = (index % board_size)
                    .abs_diff(center)
                    .max((index / board_size).abs_diff(center));
                7usize.saturating_sub(distance) as f64
            })
            .collect();

        Self {
            board_size,
            position_weights,
        }
    }

    pub fn position_weight(&self, position: Position) -> f64 {
        if position.x >= self.board_size || position.y >= self.board_size {
            return 0.0;
        }

        self.position_weights[position.y * self.board_size + position.x]
    }

    pub fn best_move(&self, board: &Board, player: Player, difficulty: Difficulty) -> Candidate {
        self.best_move_with_rng(board, player, difficulty, &mut rand::thread_rng())
    }

    /// Picks a move by strict priority: wins, forced blocks, fours, double threats, then the
    /// highest evaluated candidate (first in row-major order on ties).
    pub fn best_move_with_rng<R: Rng>(
        &self,
        board: &Board,
        player: Player,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Candidate {
        let profile = difficulty.profile();
        let opponent = player.opponent();

        if let Some(position) = find_winning_move(board, player) {
            return Candidate::new(position, 1_000_000.0, CandidateKind::Winning, "completes five in a row", 1.0);
        }

        if let Some(position) = find_winning_move(board, opponent) {
            return Candidate::new(position, 900_000.0, CandidateKind::DefendWin, "blocks the opponent's five", 0.99);
        }

        if let Some(position) = find_shape_move(board, player, &patterns::OPEN_FOUR_SHAPES) {
            return Candidate::new(position, 100_000.0, CandidateKind::LiveFour, "forms an open four", 0.95);
        }

        if let Some(position) = find_shape_move(board, opponent, &patterns::OPEN_FOUR_SHAPES) {
            return Candidate::new(position, 90_000.0, CandidateKind::DefendLiveFour, "prevents the opponent's open four", 0.95);
        }

        if profile.blocked_four_enabled {
            if let Some(position) = find_shape_move(board, player, &patterns::BLOCKED_FOUR_SHAPES) {
                return Candidate::new(position, 50_000.0, CandidateKind::BlockedFour, "forms a four", 0.85);
            }
        }

        if let Some(position) = find_shape_move(board, opponent, &patterns::BLOCKED_FOUR_SHAPES) {
            return Candidate::new(position, 45_000.0, CandidateKind::DefendBlockedFour, "prevents the opponent's four", 0.9);
        }

        if profile.double_threat_enabled {
            if let Some(position) = find_double_threat_move(board, player) {
                return Candidate::new(position, 30_000.0, CandidateKind::DoubleThreat, "creates two threats at once", 0.8);
            }
        }

        let candidates = candidate_positions(board, CANDIDATE_RADIUS);
        let mut best: Option<Candidate> = None;

        for &position in &candidates {
            let score = self.evaluate_position(board, position, player, profile.evaluation_scale);
            if best.as_ref().map_or(true, |best| best.score < score) {
                best = Some(Candidate::new(
                    position,
                    score,
                    CandidateKind::Evaluated,
                    format!("evaluated score {score:.0}"),
                    0.6,
                ));
            }
        }

        if 0.0 < profile.random_move_rate && rng.gen_bool(profile.random_move_rate) {
            let pool = &candidates[..candidates.len().min(RANDOM_POOL)];
            if let Some(&position) = pool.choose(rng) {
                return Candidate::new(position, 0.0, CandidateKind::Random, "plays a random nearby cell", 0.3);
            }
        }

        best.unwrap_or_else(|| {
            Candidate::new(board.center(), 0.0, CandidateKind::Default, "defaults to the center", 0.5)
        })
    }

    /// Scores placing `player`'s stone at `position`: offense, defense, connectivity and
    /// center preference, multiplied by `scale`.
    pub fn evaluate_position(&self, board: &Board, position: Position, player: Player, scale: f64) -> f64 {
        let opponent = player.opponent();
        let mut score = self.position_weight(position) * POSITION_WEIGHT;

        score += evaluate_patterns(&board.with_stone(position, player), position, player) * OFFENSE_WEIGHT;
        score += evaluate_patterns(&board.with_stone(position, opponent), position, opponent) * DEFENSE_WEIGHT;
        score += connectivity(board, position, player) * CONNECTIVITY_WEIGHT;

        score * scale
    }
}

/// Reads the nine cells centered on `position` along `(dx, dy)` from `player`'s perspective.
pub fn line_window(board: &Board, position: Position, dx: isize, dy: isize, player: Player) -> LineWindow {
    let own: Cell = player.into();
    let mut window = [BLOCKED; WINDOW_LEN];

    for (slot, step) in window.iter_mut().zip(-(WINDOW_RADIUS as isize)..) {
        *slot = match position
            .offset(step * dx, step * dy, board.board_size())
            .and_then(|neighbor| board.get(neighbor))
        {
            Some(cell) if cell == own => OWN,
            Some(Cell::Empty) => EMPTY,
            _ => BLOCKED,
        };
    }

    window
}

fn evaluate_patterns(board: &Board, position: Position, player: Player) -> f64 {
    DIRECTIONS
        .iter()
        .map(|&(dx, dy)| patterns::score_window(&line_window(board, position, dx, dy, player)))
        .sum()
}

/// Bonus for same-color stones adjacent to `position`, and more for a second one behind them.
fn connectivity(board: &Board, position: Position, player: Player) -> f64 {
    let own: Cell = player.into();
    let is_own = |dx: isize, dy: isize| {
        position
            .offset(dx, dy, board.board_size())
            .and_then(|neighbor| board.get(neighbor))
            == Some(own)
    };

    let mut score = 0.0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if (dx, dy) == (0, 0) || !is_own(dx, dy) {
                continue;
            }

            score += 3.0;
            if is_own(dx * 2, dy * 2) {
                score += 5.0;
            }
        }
    }

    score
}

/// First empty cell (row-major) where `player` would complete five in a row.
pub fn find_winning_move(board: &Board, player: Player) -> Option<Position> {
    let mut scratch = board.clone();

    board.legal_moves().into_iter().find(|&position| {
        scratch.set(position, player.into());
        let wins = scratch.is_winning_move(position, player);
        scratch.set(position, Cell::Empty);
        wins
    })
}

/// First empty cell (row-major) where placing `player`'s stone creates one of `shapes` on a
/// line through that cell.
pub fn find_shape_move(board: &Board, player: Player, shapes: &[&[u8]]) -> Option<Position> {
    let mut scratch = board.clone();

    board.legal_moves().into_iter().find(|&position| {
        scratch.set(position, player.into());
        let found = DIRECTIONS.iter().any(|&(dx, dy)| {
            patterns::contains_any(&line_window(&scratch, position, dx, dy, player), shapes)
        });
        scratch.set(position, Cell::Empty);
        found
    })
}

/// First empty cell (row-major) where `player` would create threats on two or more lines.
pub fn find_double_threat_move(board: &Board, player: Player) -> Option<Position> {
    let mut scratch = board.clone();

    board.legal_moves().into_iter().find(|&position| {
        scratch.set(position, player.into());
        let threats = DIRECTIONS
            .iter()
            .filter(|&&(dx, dy)| {
                patterns::contains_any(
                    &line_window(&scratch, position, dx, dy, player),
                    &patterns::THREAT_SHAPES,
                )
            })
            .count();
        scratch.set(position, Cell::Empty);
        2 <= threats
    })
}

/// Empty cells within `radius` of any stone in row-major order, or the 5x5 block around the
/// center when the board is empty.
pub fn candidate_positions(board: &Board, radius: usize) -> Vec<Position> {
    if board.is_empty() {
        let center = board.center();
        return board
            .positions()
            .filter(|&position| position.distance(center) <= 2)
            .collect();
    }

    board
        .legal_moves()
        .into_iter()
        .filter(|&position| board.has_stone_within(position, radius))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board_with(stones: &[(usize, usize, Player)]) -> Board {
        let mut board = Board::default();
        for &(x, y, player) in stones {
            board.set(Position::new(x, y), player.into());
        }
        board
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_open_four_is_completed() {
        let board = board_with(&[
            (7, 6, Player::Black),
            (7, 7, Player::Black),
            (7, 8, Player::Black),
            (7, 9, Player::Black),
            (3, 3, Player::White),
            (4, 3, Player::White),
        ]);

        for difficulty in Difficulty::ALL {
            let candidate = HeuristicEvaluator::default().best_move_with_rng(
                &board,
                Player::Black,
                difficulty,
                &mut rng(),
            );
            assert_eq!(candidate.position, Position::new(7, 5));
            assert_eq!(candidate.kind, CandidateKind::Winning);
            assert_eq!(candidate.score, 1_000_000.0);
        }
    }

    #[test]
    fn test_opponent_open_four_is_blocked() {
        let board = board_with(&[
            (2, 10, Player::White),
            (3, 10, Player::White),
            (4, 10, Player::White),
            (5, 10, Player::White),
            (7, 7, Player::Black),
            (9, 2, Player::Black),
        ]);

        let candidate = HeuristicEvaluator::default().best_move_with_rng(
            &board,
            Player::Black,
            Difficulty::Master,
            &mut rng(),
        );
        assert_eq!(candidate.kind, CandidateKind::DefendWin);
        assert!([Position::new(1, 10), Position::new(6, 10)].contains(&candidate.position));
    }

    #[test]
    fn test_live_four_is_created() {
        let board = board_with(&[
            (6, 7, Player::Black),
            (7, 7, Player::Black),
            (8, 7, Player::Black),
            (7, 2, Player::White),
            (12, 12, Player::White),
        ]);

        let candidate = HeuristicEvaluator::default().best_move_with_rng(
            &board,
            Player::Black,
            Difficulty::College,
            &mut rng(),
        );
        assert_eq!(candidate.kind, CandidateKind::LiveFour);
        assert!([Position::new(5, 7), Position::new(9, 7)].contains(&candidate.position));
    }

    #[test]
    fn test_opponent_open_three_is_defended() {
        let board = board_with(&[
            (6, 7, Player::White),
            (7, 7, Player::White),
            (8, 7, Player::White),
            (0, 14, Player::Black),
        ]);

        let candidate = HeuristicEvaluator::default().best_move_with_rng(
            &board,
            Player::Black,
            Difficulty::Master,
            &mut rng(),
        );
        assert_eq!(candidate.kind, CandidateKind::DefendLiveFour);
        assert!([Position::new(5, 7), Position::new(9, 7)].contains(&candidate.position));
    }

    #[test]
    fn test_blocked_four_is_skipped_at_elementary() {
        // black three against the edge: extending makes only a blocked four
        let board = board_with(&[
            (0, 7, Player::Black),
            (1, 7, Player::Black),
            (2, 7, Player::Black),
            (12, 12, Player::White),
        ]);
        let evaluator = HeuristicEvaluator::default();

        let college = evaluator.best_move_with_rng(&board, Player::Black, Difficulty::College, &mut rng());
        assert_eq!(college.kind, CandidateKind::BlockedFour);

        let elementary = evaluator.best_move_with_rng(&board, Player::Black, Difficulty::Elementary, &mut rng());
        assert_ne!(elementary.kind, CandidateKind::BlockedFour);
    }

    #[test]
    fn test_empty_board_prefers_center() {
        let candidate = HeuristicEvaluator::default().best_move_with_rng(
            &Board::default(),
            Player::Black,
            Difficulty::Master,
            &mut rng(),
        );
        assert_eq!(candidate.position, Position::new(7, 7));
        assert_eq!(candidate.kind, CandidateKind::Evaluated);
    }

    #[test]
    fn test_full_board_falls_back_to_center() {
        let mut board = Board::new(3);
        for (index, position) in board.clone().positions().enumerate() {
            let cell = if index % 2 == 0 { Cell::Black } else { Cell::White };
            board.set(position, cell);
        }

        let candidate = HeuristicEvaluator::new(3).best_move_with_rng(
            &board,
            Player::Black,
            Difficulty::Master,
            &mut rng(),
        );
        assert_eq!(candidate.kind, CandidateKind::Default);
        assert_eq!(candidate.position, Position::new(1, 1));
        assert_eq!(candidate.score, 0.0);
    }

    #[test]
    fn test_elementary_scores_are_damped() {
        let board = board_with(&[(7, 7, Player::White)]);
        let evaluator = HeuristicEvaluator::default();
        let position = Position::new(8, 8);

        let full = evaluator.evaluate_position(&board, position, Player::Black, 1.0);
        let damped = evaluator.evaluate_position(&board, position, Player::Black, Difficulty::Elementary.profile().evaluation_scale);
        assert!(0.0 < full);
        assert_eq!(damped, full * 0.5);
    }

    #[test]
    fn test_candidate_positions_are_row_major_and_near_stones() {
        let board = board_with(&[(0, 0, Player::Black)]);
        let candidates = candidate_positions(&board, 2);

        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates.first(), Some(&Position::new(1, 0)));
        assert_eq!(candidates.last(), Some(&Position::new(2, 2)));
        assert_eq!(candidate_positions(&Board::default(), 2).len(), 25);
    }

    #[test]
    fn test_line_window_marks_edges_as_blocked() {
        let board = board_with(&[(1, 0, Player::Black), (2, 0, Player::White)]);
        let window = line_window(&board, Position::new(0, 0), 1, 0, Player::Black);
        assert_eq!(&window, b"222201200");
    }

    #[test]
    fn test_double_threat() {
        // two broken lines meeting at (7,7)
        let board = board_with(&[
            (5, 7, Player::Black),
            (6, 7, Player::Black),
            (7, 5, Player::Black),
            (7, 6, Player::Black),
            (0, 14, Player::White),
            (14, 0, Player::White),
        ]);

        assert_eq!(find_double_threat_move(&board, Player::Black), Some(Position::new(7, 7)));
    }

    #[test]
    fn test_elementary_sometimes_plays_a_nearby_random_cell() {
        let board = board_with(&[(7, 7, Player::Black), (8, 8, Player::White)]);
        let pool = candidate_positions(&board, CANDIDATE_RADIUS)[..RANDOM_POOL].to_vec();
        let evaluator = HeuristicEvaluator::default();

        let random = (0..200)
            .map(|seed| {
                evaluator.best_move_with_rng(
                    &board,
                    Player::Black,
                    Difficulty::Elementary,
                    &mut StdRng::seed_from_u64(seed),
                )
            })
            .filter(|candidate| candidate.kind == CandidateKind::Random)
            .collect::<Vec<_>>();

        // roughly 30% of 200 draws
        assert!((30..=90).contains(&random.len()));
        for candidate in random {
            assert!(pool.contains(&candidate.position));
            assert_eq!(candidate.score, 0.0);
        }

        for seed in 0..20 {
            let candidate = evaluator.best_move_with_rng(
                &board,
                Player::Black,
                Difficulty::Master,
                &mut StdRng::seed_from_u64(seed),
            );
            assert_ne!(candidate.kind, CandidateKind::Random);
        }
    }
}
