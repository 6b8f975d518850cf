//! Static table of opening continuations keyed by the exact move sequence.

use crate::difficulty::Difficulty;
use gomoku_core::{board::Position, game::Move};
use rand::{seq::SliceRandom, Rng};
use std::collections::HashMap;
use tracing::debug;

/// Number of plies for which the book is consulted.
pub const MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpeningStyle {
    Standard,
    Flexible,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningEntry {
    pub position: Position,
    pub name: &'static str,
    pub win_rate: f64,
    pub style: OpeningStyle,
}

const fn entry(x: usize, y: usize, name: &'static str, win_rate: f64, style: OpeningStyle) -> OpeningEntry {
    OpeningEntry {
        position: Position::new(x, y),
        name,
        win_rate,
        style,
    }
}

#[derive(Debug, Clone)]
pub struct OpeningBook {
    max_depth: usize,
    book: HashMap<String, Vec<OpeningEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningBookStats {
    pub positions: usize,
    pub max_depth: usize,
}

impl Default for OpeningBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningBook {
    pub fn new() -> Self {
        use OpeningStyle::*;

        let lines: [(&str, Vec<OpeningEntry>); 7] = [
            // the first stone always goes to the center
            ("", vec![entry(7, 7, "center opening", 0.52, Standard)]),
            (
                "b7.7",
                vec![
                    entry(6, 6, "diagonal star", 0.52, Balanced),
                    entry(8, 8, "diagonal star", 0.52, Balanced),
                    entry(6, 7, "direct contact", 0.50, Aggressive),
                    entry(7, 6, "direct contact", 0.50, Aggressive),
                ],
            ),
            (
                "b7.7,w6.6",
                vec![
                    entry(8, 8, "symmetric shape", 0.53, Standard),
                    entry(7, 6, "vertical press", 0.52, Aggressive),
                    entry(6, 7, "horizontal press", 0.52, Aggressive),
                ],
            ),
            (
                "b7.7,w8.8",
                vec![
                    entry(6, 6, "symmetric shape", 0.53, Standard),
                    entry(7, 8, "vertical press", 0.52, Aggressive),
                ],
            ),
            (
                "b6.6",
                vec![
                    entry(8, 8, "diagonal answer", 0.51, Balanced),
                    entry(7, 7, "center control", 0.52, Standard),
                    entry(6, 8, "flank press", 0.50, Aggressive),
                ],
            ),
            (
                "b6.6,w7.7",
                vec![
                    entry(8, 8, "triangle shape", 0.53, Standard),
                    entry(5, 5, "extended star", 0.51, Flexible),
                ],
            ),
            (
                "b8.8",
                vec![
                    entry(6, 6, "diagonal answer", 0.51, Balanced),
                    entry(7, 7, "center control", 0.52, Standard),
                    entry(8, 6, "flank press", 0.50, Aggressive),
                ],
            ),
        ];

        let book = lines
            .into_iter()
            .map(|(signature, entries)| (signature.to_owned(), entries))
            .collect::<HashMap<_, _>>();

        debug!(positions = book.len(), "opening book loaded");

        Self {
            max_depth: MAX_DEPTH,
            book,
        }
    }

    /// Encodes a move sequence, e.g. `b7.7,w6.6`.
    pub fn signature(history: &[Move]) -> String {
        history
            .iter()
            .map(|m| format!("{}{}.{}", m.player.initial(), m.position.x, m.position.y))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns the book continuations for `history`, or `None` past the book depth.
    pub fn query(&self, history: &[Move]) -> Option<&[OpeningEntry]> {
        if self.max_depth <= history.len() {
            return None;
        }

        let signature = Self::signature(history);
        let entries = self.book.get(&signature)?;

        debug!(signature, options = entries.len(), "opening book hit");
        Some(entries)
    }

    pub fn select_best_move<'a>(&self, entries: &'a [OpeningEntry], difficulty: Difficulty) -> Option<&'a OpeningEntry> {
        self.select_best_move_with_rng(entries, difficulty, &mut rand::thread_rng())
    }

    /// Elementary picks uniformly, college the best win rate, master the first aggressive line.
    pub fn select_best_move_with_rng<'a, R: Rng>(
        &self,
        entries: &'a [OpeningEntry],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Option<&'a OpeningEntry> {
        match difficulty {
            Difficulty::Elementary => entries.choose(rng),
            Difficulty::College => entries
                .iter()
                .reduce(|best, entry| if best.win_rate < entry.win_rate { entry } else { best }),
            Difficulty::Master => entries
                .iter()
                .find(|entry| entry.style == OpeningStyle::Aggressive)
                .or_else(|| entries.first()),
        }
    }

    pub fn stats(&self) -> OpeningBookStats {
        OpeningBookStats {
            positions: self.book.len(),
            max_depth: self.max_depth,
        }
    }
}
