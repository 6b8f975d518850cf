use gomoku_core::board::Position;
use serde::Serialize;
use std::fmt::Display;

/// Why a candidate was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    Winning,
    DefendWin,
    LiveFour,
    DefendLiveFour,
    BlockedFour,
    DefendBlockedFour,
    DoubleThreat,
    Evaluated,
    Random,
    Default,
    Remote,
}

impl CandidateKind {
    pub fn name(self) -> &'static str {
        match self {
            CandidateKind::Winning => "winning",
            CandidateKind::DefendWin => "defend-win",
            CandidateKind::LiveFour => "live-four",
            CandidateKind::DefendLiveFour => "defend-live-four",
            CandidateKind::BlockedFour => "blocked-four",
            CandidateKind::DefendBlockedFour => "defend-blocked-four",
            CandidateKind::DoubleThreat => "double-threat",
            CandidateKind::Evaluated => "evaluated",
            CandidateKind::Random => "random",
            CandidateKind::Default => "default",
            CandidateKind::Remote => "remote",
        }
    }
}

impl Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A scored move proposal. Never mutated once built; blending produces new values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub position: Position,
    pub score: f64,
    pub kind: CandidateKind,
    pub rationale: String,
    pub confidence: f64,
}

impl Candidate {
    pub fn new(
        position: Position,
        score: f64,
        kind: CandidateKind,
        rationale: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            position,
            score,
            kind,
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Which pipeline stage produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    Opening,
    Cache,
    Urgent,
    Local,
    Agreed,
    Remote,
    LocalPrimary,
}

impl DecisionSource {
    pub fn name(self) -> &'static str {
        match self {
            DecisionSource::Opening => "opening",
            DecisionSource::Cache => "cache",
            DecisionSource::Urgent => "urgent",
            DecisionSource::Local => "local",
            DecisionSource::Agreed => "agreed",
            DecisionSource::Remote => "remote",
            DecisionSource::LocalPrimary => "local-primary",
        }
    }
}

/// The single move handed back to the caller for a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveDecision {
    pub position: Position,
    pub confidence: f64,
    pub rationale: String,
    pub alternatives: Vec<Position>,
    pub source: DecisionSource,
}

impl MoveDecision {
    pub fn from_candidate(candidate: &Candidate, source: DecisionSource) -> Self {
        Self {
            position: candidate.position,
            confidence: candidate.confidence,
            rationale: format!("[{}] {}", source.name(), candidate.rationale),
            alternatives: vec![],
            source,
        }
    }
}
