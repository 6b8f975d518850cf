use serde::Deserialize;
use std::{cmp::Ordering, time::Duration};
use tokio::time::Instant;

/// Wire format spoken by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiFlavor {
    /// `POST /v1/chat/completions` with bearer authentication.
    #[default]
    OpenaiChat,
    /// `POST /v1/messages` with `x-api-key` authentication.
    AnthropicMessages,
}

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub flavor: ApiFlavor,
}

fn enabled_by_default() -> bool {
    true
}

impl ProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|name| std::env::var(name).ok())
            })
            .filter(|key| !key.trim().is_empty())
    }
}

/// The built-in provider roster. Keys are read from the environment.
pub fn default_providers() -> Vec<ProviderConfig> {
    let provider = |id: &str, name: &str, base_url: &str, model: &str, env: &str, flavor| ProviderConfig {
        id: id.to_owned(),
        name: name.to_owned(),
        base_url: base_url.to_owned(),
        model: model.to_owned(),
        api_key: None,
        api_key_env: Some(env.to_owned()),
        enabled: true,
        flavor,
    };

    vec![
        provider(
            "kimi",
            "Kimi AI",
            "https://api.kimi.com/coding",
            "kimi-for-coding",
            "KIMI_API_KEY",
            ApiFlavor::AnthropicMessages,
        ),
        provider(
            "nyxar",
            "Nyxar AI",
            "https://api.nyxar.org",
            "gpt-4o-mini",
            "NYXAR_API_KEY",
            ApiFlavor::OpenaiChat,
        ),
        provider(
            "siliconflow",
            "SiliconFlow AI",
            "https://api.siliconflow.cn",
            "deepseek-ai/DeepSeek-V3",
            "SILICONFLOW_API_KEY",
            ApiFlavor::OpenaiChat,
        ),
    ]
}

/// Last probe result for a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Latency {
    #[default]
    Unknown,
    Measured(Duration),
    /// The probe failed, timed out or returned a non-2xx status.
    Unreachable,
}

impl Latency {
    pub fn is_unreachable(self) -> bool {
        matches!(self, Latency::Unreachable)
    }

    /// Measured latencies first (fastest first), then unknown, then unreachable.
    pub fn rank(self, other: Latency) -> Ordering {
        match (self, other) {
            (Latency::Measured(lhs), Latency::Measured(rhs)) => lhs.cmp(&rhs),
            _ => self.tier().cmp(&other.tier()),
        }
    }

    fn tier(self) -> u8 {
        match self {
            Latency::Measured(_) => 0,
            Latency::Unknown => 1,
            Latency::Unreachable => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub flavor: ApiFlavor,
    pub enabled: bool,
    pub latency: Latency,
    pub last_checked: Option<Instant>,
    api_key: String,
}

impl ProviderDescriptor {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            flavor: config.flavor,
            enabled: config.enabled,
            latency: Latency::Unknown,
            last_checked: None,
            api_key: config.resolve_api_key().unwrap_or_default(),
        }
    }

    /// Enabled and holding an API key.
    pub fn is_available(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    pub fn completion_endpoint(&self) -> String {
        match self.flavor {
            ApiFlavor::OpenaiChat => format!("{}/v1/chat/completions", self.base_url),
            ApiFlavor::AnthropicMessages => format!("{}/v1/messages", self.base_url),
        }
    }

    pub fn probe_endpoint(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    /// Authentication headers for this provider's flavor.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self.flavor {
            ApiFlavor::OpenaiChat => vec![("authorization", format!("Bearer {}", self.api_key))],
            ApiFlavor::AnthropicMessages => vec![
                ("x-api-key", self.api_key.clone()),
                ("anthropic-version", ANTHROPIC_VERSION.to_owned()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(flavor: ApiFlavor, api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            id: "p".to_owned(),
            name: "P".to_owned(),
            base_url: "https://example.test/".to_owned(),
            model: "m".to_owned(),
            api_key: api_key.map(str::to_owned),
            api_key_env: None,
            enabled: true,
            flavor,
        }
    }

    #[test]
    fn test_availability_requires_key() {
        assert!(ProviderDescriptor::from_config(&config(ApiFlavor::OpenaiChat, Some("k"))).is_available());
        assert!(!ProviderDescriptor::from_config(&config(ApiFlavor::OpenaiChat, Some("  "))).is_available());
        assert!(!ProviderDescriptor::from_config(&config(ApiFlavor::OpenaiChat, None)).is_available());
    }

    #[test]
    fn test_flavor_endpoints_and_headers() {
        let openai = ProviderDescriptor::from_config(&config(ApiFlavor::OpenaiChat, Some("k")));
        assert_eq!(openai.completion_endpoint(), "https://example.test/v1/chat/completions");
        assert_eq!(openai.probe_endpoint(), "https://example.test/v1/models");
        assert_eq!(openai.headers(), vec![("authorization", "Bearer k".to_owned())]);

        let anthropic = ProviderDescriptor::from_config(&config(ApiFlavor::AnthropicMessages, Some("k")));
        assert_eq!(anthropic.completion_endpoint(), "https://example.test/v1/messages");
        assert!(anthropic.headers().contains(&("anthropic-version", ANTHROPIC_VERSION.to_owned())));
    }

    #[test]
    fn test_latency_rank() {
        let fast = Latency::Measured(Duration::from_millis(10));
        let slow = Latency::Measured(Duration::from_millis(90));

        assert_eq!(fast.rank(slow), Ordering::Less);
        assert_eq!(slow.rank(Latency::Unknown), Ordering::Less);
        assert_eq!(Latency::Unknown.rank(Latency::Unreachable), Ordering::Less);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"id":"x","name":"X","base_url":"https://x.test","model":"m","flavor":"anthropic-messages"}"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.flavor, ApiFlavor::AnthropicMessages);
        assert_eq!(default_providers().len(), 3);
    }
}
