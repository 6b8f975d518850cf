use super::{
    error::AdvisoryError,
    provider::{ApiFlavor, ProviderConfig, ProviderDescriptor},
    transport::{AdvisoryTransport, ChatRequest},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

pub(crate) fn descriptor(id: &str) -> ProviderDescriptor {
    ProviderDescriptor::from_config(&ProviderConfig {
        id: id.to_owned(),
        name: id.to_uppercase(),
        base_url: format!("https://{id}.test"),
        model: "test-model".to_owned(),
        api_key: Some("test-key".to_owned()),
        api_key_env: None,
        enabled: true,
        flavor: ApiFlavor::OpenaiChat,
    })
}

#[derive(Debug, Clone)]
pub(crate) enum Probe {
    Ok(Duration),
    Fail,
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Status(u16),
    Delayed(Duration, String),
    Hang,
}

impl Reply {
    pub(crate) fn text(text: &str) -> Self {
        Reply::Text(text.to_owned())
    }
}

/// Scripted transport. The last queued reply for a provider repeats once the queue drains;
/// providers without a script answer with status 503.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    probes: HashMap<String, Probe>,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    probe_count: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn probe(mut self, id: &str, probe: Probe) -> Self {
        self.probes.insert(id.to_owned(), probe);
        self
    }

    pub(crate) fn replies(self, id: &str, replies: Vec<Reply>) -> Self {
        self.replies.lock().insert(id.to_owned(), replies.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryTransport for MockTransport {
    async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), AdvisoryError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);

        match self.probes.get(&provider.id).cloned().unwrap_or(Probe::Ok(Duration::ZERO)) {
            Probe::Ok(latency) => {
                tokio::time::sleep(latency).await;
                Ok(())
            }
            Probe::Fail => Err(AdvisoryError::Status {
                provider: provider.id.clone(),
                status: 503,
            }),
            Probe::Hang => std::future::pending().await,
        }
    }

    async fn complete(
        &self,
        provider: &ProviderDescriptor,
        _request: &ChatRequest,
    ) -> Result<String, AdvisoryError> {
        self.calls.lock().push(provider.id.clone());

        let reply = {
            let mut replies = self.replies.lock();
            match replies.get_mut(&provider.id) {
                Some(queue) if 1 < queue.len() => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Status(status)) => Err(AdvisoryError::Status {
                provider: provider.id.clone(),
                status,
            }),
            None => Err(AdvisoryError::Status {
                provider: provider.id.clone(),
                status: 503,
            }),
        }
    }
}
