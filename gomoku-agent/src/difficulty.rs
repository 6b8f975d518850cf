use serde::{Deserialize, Serialize};
use std::{fmt::Display, time::Duration};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Elementary,
    #[default]
    College,
    Master,
}

/// Static per-tier tuning of the decision pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    /// Whether remote advisory services may be consulted at all.
    pub remote_enabled: bool,
    /// Probability of taking a differing remote suggestion over the local one.
    pub remote_weight: f64,
    /// Sampling temperature sent to the advisory service.
    pub temperature: f64,
    /// Range of the simulated thinking delay applied before a move is returned.
    pub thinking_time: (Duration, Duration),
    /// Local score at or above which the local move is returned without consultation.
    pub urgency_threshold: f64,
    /// Multiplier applied to evaluated (non-forced) scores.
    pub evaluation_scale: f64,
    /// Probability of replacing the evaluated move with a random nearby candidate.
    pub random_move_rate: f64,
    /// Whether the evaluator looks for its own blocked fours.
    pub blocked_four_enabled: bool,
    /// Whether the evaluator looks for double threats.
    pub double_threat_enabled: bool,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Elementary, Difficulty::College, Difficulty::Master];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Elementary => "elementary",
            Difficulty::College => "college",
            Difficulty::Master => "master",
        }
    }

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Elementary => DifficultyProfile {
                remote_enabled: false,
                remote_weight: 0.0,
                temperature: 1.0,
                thinking_time: (Duration::from_millis(500), Duration::from_millis(1500)),
                urgency_threshold: 10_000.0,
                evaluation_scale: 0.5,
                random_move_rate: 0.3,
                blocked_four_enabled: false,
                double_threat_enabled: false,
            },
            Difficulty::College => DifficultyProfile {
                remote_enabled: true,
                remote_weight: 0.3,
                temperature: 0.8,
                thinking_time: (Duration::from_millis(1000), Duration::from_millis(2500)),
                urgency_threshold: 10_000.0,
                evaluation_scale: 0.8,
                random_move_rate: 0.0,
                blocked_four_enabled: true,
                double_threat_enabled: false,
            },
            Difficulty::Master => DifficultyProfile {
                remote_enabled: true,
                remote_weight: 0.4,
                temperature: 0.5,
                thinking_time: (Duration::from_millis(2000), Duration::from_millis(4000)),
                urgency_threshold: 10_000.0,
                evaluation_scale: 1.0,
                random_move_rate: 0.0,
                blocked_four_enabled: true,
                double_threat_enabled: true,
            },
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
