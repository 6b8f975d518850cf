use super::{
    error::AdvisoryError,
    provider::{ApiFlavor, ProviderDescriptor},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// A single advisory request, independent of the provider's wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[async_trait]
pub trait AdvisoryTransport: Send + Sync {
    /// Lightweight reachability check; any successful answer is a pass.
    async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), AdvisoryError>;

    /// Sends `request` and returns the raw text the model answered with.
    async fn complete(
        &self,
        provider: &ProviderDescriptor,
        request: &ChatRequest,
    ) -> Result<String, AdvisoryError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gomoku-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    fn request_body(provider: &ProviderDescriptor, request: &ChatRequest) -> serde_json::Value {
        match provider.flavor {
            ApiFlavor::OpenaiChat => json!({
                "model": provider.model,
                "messages": [
                    { "role": "system", "content": request.system },
                    { "role": "user", "content": request.user },
                ],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }),
            ApiFlavor::AnthropicMessages => json!({
                "model": provider.model,
                "system": request.system,
                "messages": [
                    { "role": "user", "content": request.user },
                ],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }),
        }
    }
}

#[async_trait]
impl AdvisoryTransport for HttpTransport {
    async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), AdvisoryError> {
        let mut builder = self.client.get(provider.probe_endpoint());
        for (name, value) in provider.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(AdvisoryError::Status {
                provider: provider.id.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    async fn complete(
        &self,
        provider: &ProviderDescriptor,
        request: &ChatRequest,
    ) -> Result<String, AdvisoryError> {
        let mut builder = self
            .client
            .post(provider.completion_endpoint())
            .json(&Self::request_body(provider, request));
        for (name, value) in provider.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(AdvisoryError::Status {
                provider: provider.id.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        extract_text(provider.flavor, &body)
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Pulls the model's text out of a completion response body.
pub fn extract_text(flavor: ApiFlavor, body: &str) -> Result<String, AdvisoryError> {
    let text = match flavor {
        ApiFlavor::OpenaiChat => {
            let completion: ChatCompletion = serde_json::from_str(body)?;
            completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
        }
        ApiFlavor::AnthropicMessages => {
            let response: MessagesResponse = serde_json::from_str(body)?;
            response
                .content
                .into_iter()
                .find(|block| block.kind == "text")
                .and_then(|block| block.text)
        }
    };

    text.ok_or_else(|| AdvisoryError::Malformed("response carries no text content".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_openai_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"move\":{\"x\":7,\"y\":7}}"}}]}"#;
        assert_eq!(
            extract_text(ApiFlavor::OpenaiChat, body).unwrap(),
            r#"{"move":{"x":7,"y":7}}"#
        );
    }

    #[test]
    fn test_extract_anthropic_text_skips_other_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"hello"}]}"#;
        assert_eq!(extract_text(ApiFlavor::AnthropicMessages, body).unwrap(), "hello");
    }

    #[test]
    fn test_extract_missing_text_is_malformed() {
        assert!(matches!(
            extract_text(ApiFlavor::OpenaiChat, r#"{"choices":[]}"#),
            Err(AdvisoryError::Malformed(_))
        ));
        assert!(matches!(
            extract_text(ApiFlavor::AnthropicMessages, "not json"),
            Err(AdvisoryError::Malformed(_))
        ));
    }
}
