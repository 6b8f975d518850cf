//! Remote move-advisory services: provider registry, wire transport, prompt payloads and
//! reply parsing.

mod error;
pub mod prompt;
pub mod provider;
pub mod reply;
pub mod selector;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use error::AdvisoryError;
pub use prompt::PromptBuilder;
pub use provider::{ApiFlavor, Latency, ProviderConfig, ProviderDescriptor};
pub use reply::{parse_reply, RemoteSuggestion};
pub use selector::{Completion, ProviderSelector};
pub use transport::{AdvisoryTransport, ChatRequest, HttpTransport};
