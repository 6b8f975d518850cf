use super::{agent::HybridAgent, options::HybridOptions, orchestrator::HybridOrchestrator};
use crate::{
    advisory::{HttpTransport, ProviderSelector},
    agent::Agent,
    agent_provider::AgentProvider,
};
use figment::Figment;
use std::{error::Error, sync::Arc};
use tracing::{info, warn};

pub struct HybridAgentProvider;

impl HybridAgentProvider {
    /// Builds the provider selector, or `None` when no provider is usable and the agent
    /// should play purely locally.
    fn advisor(
        options: &HybridOptions,
    ) -> Result<Option<Arc<ProviderSelector>>, Box<dyn Error + Send + Sync>> {
        let transport = Arc::new(HttpTransport::new()?);
        let selector = ProviderSelector::from_configs(transport, &options.providers);

        if !selector.has_available() {
            info!("no advisory provider configured with an api key, playing locally");
            return Ok(None);
        }

        if let Some(id) = &options.provider_override {
            if !selector.set_provider(id) {
                warn!(provider = %id, "provider override ignored");
            }
        }

        Ok(Some(Arc::new(selector)))
    }
}

impl AgentProvider for HybridAgentProvider {
    fn name(&self) -> String {
        "gomoku-hybrid".to_owned()
    }

    fn create_agent(&self, options: &Figment) -> Result<Box<dyn Agent>, Box<dyn Error + Send + Sync>> {
        let options = HybridOptions::from_figment(options);
        let advisor = Self::advisor(&options)?;

        info!(
            difficulty = %options.difficulty,
            remote = advisor.is_some(),
            "hybrid agent created"
        );

        Ok(Box::new(HybridAgent::new(
            HybridOrchestrator::new(advisor, &options),
            options.difficulty,
        )))
    }
}
