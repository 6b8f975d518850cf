use super::transport::ChatRequest;
use crate::{candidate::Candidate, difficulty::Difficulty};
use gomoku_core::{
    board::{Board, Cell, Position},
    game::{Move, Player},
};

pub const DEFAULT_RECENT_MOVES: usize = 8;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Builds advisory requests from game state.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    recent_moves: usize,
    max_tokens: u32,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_MOVES, DEFAULT_MAX_TOKENS)
    }
}

impl PromptBuilder {
    pub fn new(recent_moves: usize, max_tokens: u32) -> Self {
        Self {
            recent_moves,
            max_tokens,
        }
    }

    pub fn build(
        &self,
        board: &Board,
        history: &[Move],
        local: &Candidate,
        difficulty: Difficulty,
    ) -> ChatRequest {
        ChatRequest {
            system: system_prompt(difficulty, board.board_size()),
            user: self.user_prompt(board, history, local),
            temperature: difficulty.profile().temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn user_prompt(&self, board: &Board, history: &[Move], local: &Candidate) -> String {
        let player = Player::to_move(history.len());
        let mut lines = vec![
            format!("Ply: {}", history.len()),
            format!("You play: {} ({})", player.name(), player.symbol()),
        ];

        let recent = &history[history.len().saturating_sub(self.recent_moves)..];
        if recent.is_empty() {
            lines.push("Recent moves: none".to_owned());
        } else {
            lines.push("Recent moves:".to_owned());
            lines.extend(
                recent
                    .iter()
                    .map(|mv| format!("  {}. {} {}", mv.ply + 1, mv.player.name(), mv.position)),
            );
        }

        lines.push(format!("Board (x across, y down):\n{}", render_board(board)));
        lines.push(format!(
            "Local engine suggests {} ({}, score {:.0}, confidence {:.2}).",
            local.position, local.kind, local.score, local.confidence
        ));
        lines.push("Judge the hint, then give your move and two alternatives as JSON.".to_owned());

        lines.join("\n")
    }
}

/// Grid with zero-based axis labels, `X` for black, `O` for white and `.` for empty cells.
pub fn render_board(board: &Board) -> String {
    let size = board.board_size();
    let header = (0..size).map(|x| format!("{x:>3}")).collect::<String>();
    let rows = (0..size).map(|y| {
        let cells = (0..size)
            .map(|x| {
                let cell = board.get(Position::new(x, y)).unwrap_or(Cell::Empty);
                format!("{:>3}", cell.symbol())
            })
            .collect::<String>();
        format!("{y:>3}{cells}\n")
    });

    std::iter::once(format!("   {header}\n")).chain(rows).collect()
}

const GOMOKU_KNOWLEDGE: &str = "Five stones in an unbroken horizontal, vertical or diagonal line win. \
An open four (both ends empty) cannot be stopped and must be prevented one move earlier; \
an open three becomes an open four unless blocked. Always complete your own five first, \
then block the opponent's five, then their open fours and open threes.";

const OUTPUT_CONTRACT: &str = "Answer with a single JSON object and nothing else: \
{\"move\":{\"x\":<column>,\"y\":<row>},\"confidence\":<0..1>,\"reasoning\":\"<short>\",\
\"alternatives\":[{\"x\":<column>,\"y\":<row>}]}";

pub fn system_prompt(difficulty: Difficulty, board_size: usize) -> String {
    let style = match difficulty {
        Difficulty::Elementary => "You are a casual gomoku player. Prefer simple, natural moves.",
        Difficulty::College => {
            "You are a solid gomoku player. Block the opponent's threats and build your own lines."
        }
        Difficulty::Master => {
            "You are a gomoku master. Look for forcing sequences, double threats and long-term shape."
        }
    };

    format!(
        "{style}\n{GOMOKU_KNOWLEDGE}\nThe board is {board_size}x{board_size}. Coordinates are zero-based: \
         x is the column counted from the left, y is the row counted from the top. Only propose empty \
         cells.\n{OUTPUT_CONTRACT}"
    )
}
