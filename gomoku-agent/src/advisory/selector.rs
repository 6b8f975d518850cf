use super::{
    error::AdvisoryError,
    provider::{Latency, ProviderConfig, ProviderDescriptor},
    transport::{AdvisoryTransport, ChatRequest},
};
use futures::future::join_all;
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Upper bound for a single reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a selection stays valid before providers are probed again.
pub const SELECTION_TTL: Duration = Duration::from_secs(300);

/// Text returned by a provider, tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub provider: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct SelectorState {
    providers: Vec<ProviderDescriptor>,
    current: Option<String>,
    preferred: Option<String>,
    refreshed_at: Option<Instant>,
}

impl SelectorState {
    fn find(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|provider| provider.id == id)
    }

    fn select(&self) -> Option<String> {
        if let Some(preferred) = self
            .preferred
            .as_deref()
            .and_then(|id| self.find(id))
            .filter(|provider| provider.is_available())
        {
            return Some(preferred.id.clone());
        }

        self.providers
            .iter()
            .filter(|provider| provider.is_available())
            .filter(|provider| matches!(provider.latency, Latency::Measured(_)))
            .min_by(|lhs, rhs| lhs.latency.rank(rhs.latency))
            .map(|provider| provider.id.clone())
    }

    fn fallback_for(&self, failed: &str) -> Option<ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|provider| provider.id != failed && provider.is_available())
            .filter(|provider| !provider.latency.is_unreachable())
            .min_by(|lhs, rhs| lhs.latency.rank(rhs.latency))
            .cloned()
    }

    fn mark_unreachable(&mut self, id: &str) {
        if let Some(provider) = self.providers.iter_mut().find(|provider| provider.id == id) {
            provider.latency = Latency::Unreachable;
        }
    }
}

/// Chooses the advisory provider to talk to, by explicit override or by probed latency.
pub struct ProviderSelector {
    transport: Arc<dyn AdvisoryTransport>,
    state: RwLock<SelectorState>,
    refresh_guard: tokio::sync::Mutex<()>,
}

impl ProviderSelector {
    pub fn new(transport: Arc<dyn AdvisoryTransport>, providers: Vec<ProviderDescriptor>) -> Self {
        Self {
            transport,
            state: RwLock::new(SelectorState {
                providers,
                ..Default::default()
            }),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_configs(transport: Arc<dyn AdvisoryTransport>, configs: &[ProviderConfig]) -> Self {
        Self::new(
            transport,
            configs.iter().map(ProviderDescriptor::from_config).collect(),
        )
    }

    /// Whether at least one provider is enabled and has a key.
    pub fn has_available(&self) -> bool {
        self.state
            .read()
            .providers
            .iter()
            .any(|provider| provider.is_available())
    }

    pub fn providers(&self) -> Vec<ProviderDescriptor> {
        self.state.read().providers.clone()
    }

    pub fn current(&self) -> Option<ProviderDescriptor> {
        let state = self.state.read();
        state.current.as_deref().and_then(|id| state.find(id)).cloned()
    }

    /// Pins `id` as the preferred provider. Returns `false` if it is unknown or unavailable.
    pub fn set_provider(&self, id: &str) -> bool {
        let mut state = self.state.write();
        if !state.find(id).is_some_and(|provider| provider.is_available()) {
            warn!(provider = id, "cannot switch to unknown or unavailable provider");
            return false;
        }

        info!(provider = id, "advisory provider pinned");
        state.preferred = Some(id.to_owned());
        state.current = Some(id.to_owned());
        true
    }

    /// Probes every available provider concurrently and picks a new current provider.
    ///
    /// A selection younger than [`SELECTION_TTL`] is reused unless its provider has since
    /// been marked unreachable. Concurrent callers wait for a single probe round.
    pub async fn refresh(&self) -> Option<ProviderDescriptor> {
        let _guard = self.refresh_guard.lock().await;

        if let Some(current) = self.fresh_selection() {
            return Some(current);
        }

        let candidates = self
            .state
            .read()
            .providers
            .iter()
            .filter(|provider| provider.is_available())
            .cloned()
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            warn!("no advisory provider is enabled with an api key");
            return None;
        }

        let results = join_all(candidates.iter().map(|provider| self.probe(provider))).await;
        let now = Instant::now();

        let selected = {
            let mut state = self.state.write();
            for (id, latency) in results {
                if let Some(provider) = state.providers.iter_mut().find(|provider| provider.id == id) {
                    provider.latency = latency;
                    provider.last_checked = Some(now);
                }
            }

            state.current = state.select();
            if state.current.is_some() {
                state.refreshed_at = Some(now);
            }
            state.current.as_deref().and_then(|id| state.find(id)).cloned()
        };

        match &selected {
            Some(provider) => info!(
                provider = %provider.id,
                latency = ?provider.latency,
                "advisory provider selected"
            ),
            None => warn!("every advisory provider failed its probe"),
        }

        selected
    }

    fn fresh_selection(&self) -> Option<ProviderDescriptor> {
        let state = self.state.read();
        let refreshed_at = state.refreshed_at?;
        if SELECTION_TTL <= refreshed_at.elapsed() {
            return None;
        }

        let current = state.current.as_deref().and_then(|id| state.find(id))?;
        let pinned = state.preferred.as_deref() == Some(current.id.as_str());
        (pinned || !current.latency.is_unreachable()).then(|| current.clone())
    }

    async fn probe(&self, provider: &ProviderDescriptor) -> (String, Latency) {
        let started = Instant::now();
        let latency = match timeout(PROBE_TIMEOUT, self.transport.probe(provider)).await {
            Ok(Ok(())) => Latency::Measured(started.elapsed()),
            Ok(Err(err)) => {
                debug!(provider = %provider.id, error = %err, "probe failed");
                Latency::Unreachable
            }
            Err(_) => {
                debug!(provider = %provider.id, "probe timed out");
                Latency::Unreachable
            }
        };

        (provider.id.clone(), latency)
    }

    /// Sends `request` to the current provider, refreshing the selection first when it is
    /// stale.
    ///
    /// On failure the request is retried once on the next fastest provider that has not
    /// failed; that provider becomes current. When no such provider exists the selection is
    /// dropped so the next call probes again.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, AdvisoryError> {
        let provider = self.refresh().await.ok_or(AdvisoryError::NoProvider)?;

        let err = match self.transport.complete(&provider, request).await {
            Ok(text) => {
                return Ok(Completion {
                    provider: provider.id,
                    text,
                })
            }
            Err(err) => err,
        };

        warn!(provider = %provider.id, error = %err, "advisory call failed");

        let next = {
            let mut state = self.state.write();
            state.mark_unreachable(&provider.id);
            let next = state.fallback_for(&provider.id);
            match &next {
                Some(next) => state.current = Some(next.id.clone()),
                None => {
                    state.current = None;
                    state.refreshed_at = None;
                }
            }
            next
        };

        let Some(next) = next else {
            return Err(err);
        };

        info!(from = %provider.id, to = %next.id, "failing over to next provider");

        match self.transport.complete(&next, request).await {
            Ok(text) => Ok(Completion {
                provider: next.id,
                text,
            }),
            Err(err) => {
                warn!(provider = %next.id, error = %err, "fallback advisory call failed");
                self.state.write().mark_unreachable(&next.id);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::mock::{descriptor, MockTransport, Probe, Reply};

    fn request() -> ChatRequest {
        ChatRequest {
            system: "system".to_owned(),
            user: "user".to_owned(),
            temperature: 0.8,
            max_tokens: 100,
        }
    }

    fn selector(transport: MockTransport) -> (Arc<MockTransport>, ProviderSelector) {
        let transport = Arc::new(transport);
        let selector = ProviderSelector::new(
            transport.clone(),
            vec![descriptor("alpha"), descriptor("beta"), descriptor("gamma")],
        );
        (transport, selector)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fastest_provider_is_selected() {
        let (_, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Ok(Duration::from_millis(30)))
                .probe("beta", Probe::Ok(Duration::from_millis(10)))
                .probe("gamma", Probe::Fail),
        );

        assert_eq!(selector.refresh().await.unwrap().id, "beta");

        let providers = selector.providers();
        assert_eq!(providers[0].latency, Latency::Measured(Duration::from_millis(30)));
        assert_eq!(providers[2].latency, Latency::Unreachable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_counts_as_unreachable() {
        let (_, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Hang)
                .probe("beta", Probe::Hang)
                .probe("gamma", Probe::Ok(Duration::from_millis(400))),
        );

        assert_eq!(selector.refresh().await.unwrap().id, "gamma");
        assert_eq!(selector.providers()[0].latency, Latency::Unreachable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinned_provider_wins() {
        let (_, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Ok(Duration::from_millis(50)))
                .probe("beta", Probe::Ok(Duration::from_millis(10))),
        );

        assert!(selector.set_provider("alpha"));
        assert!(!selector.set_provider("delta"));
        assert_eq!(selector.current().unwrap().id, "alpha");
        assert_eq!(selector.refresh().await.unwrap().id, "alpha");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_probes_failing_yields_no_provider() {
        let (transport, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Fail)
                .probe("beta", Probe::Fail)
                .probe("gamma", Probe::Fail),
        );

        assert!(matches!(
            selector.complete(&request()).await,
            Err(AdvisoryError::NoProvider)
        ));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_is_reused_within_ttl() {
        let (transport, selector) = selector(MockTransport::new());

        selector.refresh().await.unwrap();
        selector.refresh().await.unwrap();
        assert_eq!(transport.probe_count(), 3);

        tokio::time::advance(SELECTION_TTL).await;
        selector.refresh().await.unwrap();
        assert_eq!(transport.probe_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retries_next_fastest_once() {
        let (transport, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Ok(Duration::from_millis(10)))
                .probe("beta", Probe::Ok(Duration::from_millis(20)))
                .probe("gamma", Probe::Ok(Duration::from_millis(30)))
                .replies("alpha", vec![Reply::Status(500)])
                .replies("beta", vec![Reply::text("{}")]),
        );

        let completion = selector.complete(&request()).await.unwrap();

        assert_eq!(completion.provider, "beta");
        assert_eq!(transport.calls(), vec!["alpha", "beta"]);
        assert_eq!(selector.current().unwrap().id, "beta");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failover_is_a_single_hop() {
        let (transport, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Ok(Duration::from_millis(10)))
                .probe("beta", Probe::Ok(Duration::from_millis(20)))
                .probe("gamma", Probe::Ok(Duration::from_millis(30)))
                .replies("alpha", vec![Reply::Status(500)])
                .replies("beta", vec![Reply::Status(502)])
                .replies("gamma", vec![Reply::text("{}")]),
        );

        let err = selector.complete(&request()).await.unwrap_err();

        assert!(matches!(err, AdvisoryError::Status { status: 502, .. }));
        assert_eq!(transport.calls(), vec!["alpha", "beta"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_expires_during_play() {
        let (transport, selector) = selector(MockTransport::new().replies("alpha", vec![Reply::text("{}")]));

        selector.complete(&request()).await.unwrap();
        selector.complete(&request()).await.unwrap();
        assert_eq!(transport.probe_count(), 3);

        tokio::time::advance(SELECTION_TTL).await;
        let completion = selector.complete(&request()).await.unwrap();

        assert_eq!(completion.provider, "alpha");
        assert_eq!(transport.probe_count(), 6);
        assert_eq!(transport.calls(), vec!["alpha", "alpha", "alpha"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_providers_are_probed_again() {
        let (transport, selector) = selector(
            MockTransport::new()
                .probe("alpha", Probe::Ok(Duration::from_millis(10)))
                .probe("beta", Probe::Ok(Duration::from_millis(20)))
                .probe("gamma", Probe::Fail)
                .replies("alpha", vec![Reply::Status(500), Reply::text("{}")])
                .replies("beta", vec![Reply::Status(502)]),
        );

        assert!(selector.complete(&request()).await.is_err());
        assert_eq!(transport.probe_count(), 3);
        assert!(selector
            .providers()
            .iter()
            .all(|provider| provider.latency.is_unreachable()));

        let completion = selector.complete(&request()).await.unwrap();

        assert_eq!(completion.provider, "alpha");
        assert_eq!(transport.probe_count(), 6);
        assert_eq!(transport.calls(), vec!["alpha", "beta", "alpha"]);
        assert_eq!(
            selector.providers()[0].latency,
            Latency::Measured(Duration::from_millis(10))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_failover_drops_selection() {
        let transport = Arc::new(
            MockTransport::new().replies("alpha", vec![Reply::Status(500), Reply::text("{}")]),
        );
        let selector = ProviderSelector::new(transport.clone(), vec![descriptor("alpha")]);

        assert!(selector.complete(&request()).await.is_err());
        assert!(selector.current().is_none());

        assert_eq!(selector.complete(&request()).await.unwrap().provider, "alpha");
        assert_eq!(transport.probe_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_providers_are_never_probed() {
        let transport = Arc::new(MockTransport::new());
        let mut disabled = descriptor("alpha");
        disabled.enabled = false;
        let selector = ProviderSelector::new(transport.clone(), vec![disabled]);

        assert!(!selector.has_available());
        assert!(selector.refresh().await.is_none());
        assert_eq!(transport.probe_count(), 0);
    }
}
