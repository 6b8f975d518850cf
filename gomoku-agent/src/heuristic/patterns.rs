//! One-dimensional stone patterns and their scores.
//!
//! A pattern is read along one line through a cell using the symbols
//! `1` (own stone), `0` (empty) and `2` (opponent stone or off-board).

pub const OWN: u8 = b'1';
pub const EMPTY: u8 = b'0';
pub const BLOCKED: u8 = b'2';

/// Cells read on each side of the center when building a line window.
pub const WINDOW_RADIUS: usize = 4;
pub const WINDOW_LEN: usize = WINDOW_RADIUS * 2 + 1;

pub type LineWindow = [u8; WINDOW_LEN];

#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub cells: &'static [u8],
    pub score: f64,
    pub name: &'static str,
}

const fn pattern(cells: &'static [u8], score: f64, name: &'static str) -> Pattern {
    Pattern { cells, score, name }
}

pub const FIVE: f64 = 1_000_000.0;
pub const OPEN_FOUR: f64 = 100_000.0;
pub const BLOCKED_FOUR: f64 = 10_000.0;
pub const OPEN_THREE: f64 = 5_000.0;
pub const CLOSED_THREE: f64 = 500.0;
pub const OPEN_TWO: f64 = 200.0;

pub const PATTERNS: [Pattern; 21] = [
    pattern(b"11111", FIVE, "five"),
    pattern(b"011110", OPEN_FOUR, "open-four"),
    pattern(b"211110", BLOCKED_FOUR, "blocked-four"),
    pattern(b"011112", BLOCKED_FOUR, "blocked-four"),
    pattern(b"11011", BLOCKED_FOUR, "split-four"),
    pattern(b"10111", BLOCKED_FOUR, "split-four"),
    pattern(b"11101", BLOCKED_FOUR, "split-four"),
    pattern(b"011100", OPEN_THREE, "open-three"),
    pattern(b"001110", OPEN_THREE, "open-three"),
    pattern(b"011010", OPEN_THREE, "split-three"),
    pattern(b"010110", OPEN_THREE, "split-three"),
    pattern(b"211100", CLOSED_THREE, "closed-three"),
    pattern(b"001112", CLOSED_THREE, "closed-three"),
    pattern(b"11001", CLOSED_THREE, "closed-three"),
    pattern(b"10011", CLOSED_THREE, "closed-three"),
    pattern(b"10101", CLOSED_THREE, "closed-three"),
    pattern(b"001100", OPEN_TWO, "open-two"),
    pattern(b"011000", OPEN_TWO, "open-two"),
    pattern(b"000110", OPEN_TWO, "open-two"),
    pattern(b"010100", OPEN_TWO, "open-two"),
    pattern(b"001010", OPEN_TWO, "open-two"),
];

pub const OPEN_FOUR_SHAPES: [&[u8]; 1] = [b"011110"];
pub const BLOCKED_FOUR_SHAPES: [&[u8]; 5] = [b"211110", b"011112", b"11011", b"10111", b"11101"];
pub const THREAT_SHAPES: [&[u8]; 2] = [b"01110", b"11110"];

pub fn contains(window: &LineWindow, shape: &[u8]) -> bool {
    window.windows(shape.len()).any(|cells| cells == shape)
}

pub fn contains_any(window: &LineWindow, shapes: &[&[u8]]) -> bool {
    shapes.iter().any(|shape| contains(window, shape))
}

/// Sum of the scores of every pattern present in `window`.
pub fn score_window(window: &LineWindow) -> f64 {
    PATTERNS
        .iter()
        .filter(|pattern| contains(window, pattern.cells))
        .map(|pattern| pattern.score)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(s: &str) -> LineWindow {
        s.as_bytes().try_into().unwrap()
    }

    #[test]
    fn test_pattern_score_hierarchy() {
        assert!(FIVE > OPEN_FOUR);
        assert!(OPEN_FOUR > BLOCKED_FOUR);
        assert!(BLOCKED_FOUR > OPEN_THREE);
        assert!(OPEN_THREE > CLOSED_THREE);
        assert!(CLOSED_THREE > OPEN_TWO);
    }

    #[test]
    fn test_every_pattern_is_well_formed() {
        for pattern in PATTERNS {
            assert!((5..=6).contains(&pattern.cells.len()), "{}", pattern.name);
            assert!(pattern
                .cells
                .iter()
                .all(|&c| c == OWN || c == EMPTY || c == BLOCKED));
        }
    }

    #[test]
    fn test_score_window() {
        assert_eq!(score_window(&window("000010000")), 0.0);
        assert_eq!(score_window(&window("201111000")), OPEN_FOUR);
        assert_eq!(score_window(&window("220111112")), FIVE);
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any(&window("200111002"), &THREAT_SHAPES));
        assert!(!contains_any(&window("200110002"), &THREAT_SHAPES));
    }
}
