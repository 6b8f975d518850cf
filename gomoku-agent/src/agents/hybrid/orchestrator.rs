use super::{
    arbiter::{self, RemoteMove},
    options::HybridOptions,
};
use crate::{
    admission::{AdmissionPolicy, AdmissionStats},
    advisory::{parse_reply, AdvisoryError, ChatRequest, PromptBuilder, ProviderSelector, RemoteSuggestion},
    breaker::{BreakerStats, CircuitBreaker},
    candidate::{Candidate, DecisionSource, MoveDecision},
    difficulty::Difficulty,
    heuristic::HeuristicEvaluator,
    opening_book::{OpeningBook, OpeningBookStats},
    prediction::{CacheStats, PredictiveEngine, ReplyPlanner},
    timeout::{run_with_timeout, TimeoutController, TimeoutStats},
};
use async_trait::async_trait;
use gomoku_core::{
    board::Board,
    game::{Move, Player},
};
use parking_lot::Mutex;
use rand::Rng;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{debug, info, warn};

/// Snapshot of every component's bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridStats {
    pub breaker: BreakerStats,
    pub admission: AdmissionStats,
    pub timeout: TimeoutStats,
    pub cache: CacheStats,
    pub predicting: bool,
    pub opening_book: OpeningBookStats,
    pub provider: Option<String>,
}

/// Per-turn decision pipeline: opening book, prediction cache, local evaluation, then an
/// optional remote consultation that is validated and blended with the local move.
///
/// Failures on the remote path never surface; the local candidate is always available.
pub struct HybridOrchestrator {
    evaluator: HeuristicEvaluator,
    opening_book: OpeningBook,
    predictive: Arc<PredictiveEngine>,
    admission: Mutex<AdmissionPolicy>,
    breaker: Mutex<CircuitBreaker>,
    timeouts: Mutex<TimeoutController>,
    /// Bumped by `new_game`; consultations started before a reset do not record outcomes.
    generation: AtomicU64,
    advisor: Option<Arc<ProviderSelector>>,
    prompt: PromptBuilder,
    simulate_thinking: bool,
    prediction: bool,
}

impl HybridOrchestrator {
    pub fn new(advisor: Option<Arc<ProviderSelector>>, options: &HybridOptions) -> Self {
        Self {
            evaluator: HeuristicEvaluator::default(),
            opening_book: OpeningBook::new(),
            predictive: Arc::new(PredictiveEngine::default()),
            admission: Mutex::new(AdmissionPolicy::new()),
            breaker: Mutex::new(CircuitBreaker::new()),
            timeouts: Mutex::new(TimeoutController::new()),
            generation: AtomicU64::new(0),
            advisor,
            prompt: PromptBuilder::new(options.recent_moves, options.max_tokens),
            simulate_thinking: options.simulate_thinking,
            prediction: options.prediction,
        }
    }

    pub fn advisor(&self) -> Option<&Arc<ProviderSelector>> {
        self.advisor.as_ref()
    }

    /// Decides the move for the side to play after `history` on `board`.
    pub async fn decide(
        self: &Arc<Self>,
        board: &Board,
        history: &[Move],
        difficulty: Difficulty,
    ) -> MoveDecision {
        if let Some(decision) = self.opening_move(board, history, difficulty) {
            info!(position = %decision.position, "opening book move");
            return decision;
        }

        let decision = match self.cached_move(board) {
            Some(decision) => decision,
            None => self.evaluate(board, history, difficulty).await,
        };

        info!(
            position = %decision.position,
            source = decision.source.name(),
            confidence = decision.confidence,
            "move decided"
        );

        if self.prediction {
            self.start_prediction(board, history, &decision, difficulty);
        }

        if self.simulate_thinking {
            let delay = thinking_delay(difficulty);
            debug!(delay_ms = delay.as_millis() as u64, "pacing");
            tokio::time::sleep(delay).await;
        }

        decision
    }

    pub fn new_game(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.breaker.lock().reset();
        self.admission.lock().reset();
        self.timeouts.lock().reset();
        self.predictive.reset();
        debug!("hybrid state reset for a new game");
    }

    pub fn stats(&self) -> HybridStats {
        HybridStats {
            breaker: self.breaker.lock().stats(),
            admission: self.admission.lock().stats(),
            timeout: self.timeouts.lock().stats(),
            cache: self.predictive.cache_stats(),
            predicting: self.predictive.is_busy(),
            opening_book: self.opening_book.stats(),
            provider: self
                .advisor
                .as_ref()
                .and_then(|advisor| advisor.current())
                .map(|provider| provider.id),
        }
    }

    fn opening_move(&self, board: &Board, history: &[Move], difficulty: Difficulty) -> Option<MoveDecision> {
        let entries = self.opening_book.query(history)?;
        let entry = self.opening_book.select_best_move(entries, difficulty)?;

        if !board.is_empty_at(entry.position) {
            warn!(position = %entry.position, "opening book move is occupied, ignoring the book");
            return None;
        }

        Some(MoveDecision {
            position: entry.position,
            confidence: 1.0,
            rationale: format!(
                "[{}] {} (win rate {:.0}%)",
                DecisionSource::Opening.name(),
                entry.name,
                entry.win_rate * 100.0
            ),
            alternatives: entries
                .iter()
                .map(|other| other.position)
                .filter(|&position| position != entry.position)
                .collect(),
            source: DecisionSource::Opening,
        })
    }

    fn cached_move(&self, board: &Board) -> Option<MoveDecision> {
        let cached = self.predictive.lookup(board)?;
        if !board.is_empty_at(cached.position) {
            return None;
        }

        debug!(position = %cached.position, "prediction cache hit");
        let tag = format!("[{}] ", cached.source.name());
        let reasoning = cached.rationale.strip_prefix(&tag).unwrap_or(&cached.rationale);
        Some(MoveDecision {
            rationale: format!("[{}] {}", DecisionSource::Cache.name(), reasoning),
            source: DecisionSource::Cache,
            ..cached
        })
    }

    fn start_prediction(
        self: &Arc<Self>,
        board: &Board,
        history: &[Move],
        decision: &MoveDecision,
        difficulty: Difficulty,
    ) {
        let player = Player::to_move(history.len());
        let next_board = board.with_stone(decision.position, player);
        let mut next_history = history.to_vec();
        next_history.push(Move::new(decision.position, player, history.len()));

        let planner: Arc<dyn ReplyPlanner> = self.clone();
        self.predictive.start(planner, next_board, next_history, difficulty);
    }

    /// Local evaluation followed by the gated remote consultation.
    async fn evaluate(&self, board: &Board, history: &[Move], difficulty: Difficulty) -> MoveDecision {
        let player = Player::to_move(history.len());
        let profile = difficulty.profile();
        let local = self.evaluator.best_move(board, player, difficulty);

        debug!(
            position = %local.position,
            kind = %local.kind,
            score = local.score,
            "local candidate"
        );

        if profile.urgency_threshold <= local.score {
            return MoveDecision::from_candidate(&local, DecisionSource::Urgent);
        }

        let skip = self.admission.lock().skip_reason(board, history, &local, difficulty);
        let fallback = self.breaker.lock().should_fallback();

        let advisor = match &self.advisor {
            Some(advisor) if skip.is_none() && profile.remote_enabled && !fallback => advisor,
            _ => {
                if fallback {
                    debug!(level = self.breaker.lock().level().name(), "remote advisory degraded");
                }
                return MoveDecision::from_candidate(&local, DecisionSource::Local);
            }
        };

        match self.consult(advisor, board, history, &local, difficulty).await {
            Some(remote) => arbiter::blend(&local, &remote, profile.remote_weight),
            None => MoveDecision::from_candidate(&local, DecisionSource::Local),
        }
    }

    /// Asks the advisor under the adaptive deadline and validates the answer. Records the
    /// outcome in the breaker and the admission statistics.
    async fn consult(
        &self,
        advisor: &ProviderSelector,
        board: &Board,
        history: &[Move],
        local: &Candidate,
        difficulty: Difficulty,
    ) -> Option<RemoteMove> {
        let generation = self.generation.load(Ordering::Acquire);
        let request = self.prompt.build(board, history, local, difficulty);
        let deadline = self.timeouts.lock().adaptive_timeout();

        let timed = run_with_timeout(
            ask(advisor, &request),
            deadline,
            Err(AdvisoryError::Timeout(deadline)),
        )
        .await;

        let response_time = timed.elapsed.filter(|_| timed.value.is_ok());
        let remote = match timed.value {
            Ok(suggestion) => match arbiter::validate(board, local, &suggestion) {
                Ok(remote) => Some(remote),
                Err(rejection) => {
                    warn!(%rejection, "remote suggestion rejected");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "remote consultation failed");
                None
            }
        };

        if self.generation.load(Ordering::Acquire) != generation {
            debug!("game reset during consultation, outcome not recorded");
            return remote;
        }

        if let Some(elapsed) = response_time {
            self.timeouts.lock().record_response_time(elapsed);
        }
        self.record_outcome(remote.is_some());
        remote
    }

    fn record_outcome(&self, success: bool) {
        self.breaker.lock().record(success);
        self.admission.lock().record(success);
    }
}

async fn ask(advisor: &ProviderSelector, request: &ChatRequest) -> Result<RemoteSuggestion, AdvisoryError> {
    let completion = advisor.complete(request).await?;
    let suggestion = parse_reply(&completion.text)?;

    debug!(
        provider = %completion.provider,
        x = suggestion.x,
        y = suggestion.y,
        "remote suggestion"
    );
    Ok(suggestion)
}

fn thinking_delay(difficulty: Difficulty) -> Duration {
    let (min, max) = difficulty.profile().thinking_time;
    let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Speculative decisions run the same pipeline without pacing and without starting
/// further predictions.
#[async_trait]
impl ReplyPlanner for HybridOrchestrator {
    async fn plan_reply(&self, board: Board, history: Vec<Move>, difficulty: Difficulty) -> MoveDecision {
        match self.opening_move(&board, &history, difficulty) {
            Some(decision) => decision,
            None => self.evaluate(&board, &history, difficulty).await,
        }
    }
}
