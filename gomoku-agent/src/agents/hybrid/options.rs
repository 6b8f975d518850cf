use crate::{
    advisory::{
        prompt::{DEFAULT_MAX_TOKENS, DEFAULT_RECENT_MOVES},
        provider::default_providers,
        ProviderConfig,
    },
    difficulty::Difficulty,
};
use figment::Figment;
use serde::Deserialize;
use tracing::warn;

/// Options for the hybrid agent, extracted from a [`Figment`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HybridOptions {
    pub difficulty: Difficulty,
    /// Sleep for the difficulty's thinking time before answering.
    pub simulate_thinking: bool,
    /// Precompute replies to the opponent's likely moves in the background.
    pub prediction: bool,
    /// Provider id to use regardless of probed latency.
    pub provider_override: Option<String>,
    /// How many trailing moves are sent to the advisor.
    pub recent_moves: usize,
    pub max_tokens: u32,
    pub providers: Vec<ProviderConfig>,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            simulate_thinking: true,
            prediction: true,
            provider_override: None,
            recent_moves: DEFAULT_RECENT_MOVES,
            max_tokens: DEFAULT_MAX_TOKENS,
            providers: default_providers(),
        }
    }
}

impl HybridOptions {
    /// Falls back to the defaults when the configuration cannot be extracted.
    pub fn from_figment(options: &Figment) -> Self {
        match options.extract() {
            Ok(options) => options,
            Err(err) => {
                warn!(error = %err, "invalid hybrid agent options, using defaults");
                Self::default()
            }
        }
    }
}
