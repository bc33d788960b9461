//! Provider construction from configuration.
//!
//! A plain match, injected at the composition root.  Adding a vendor means
//! adding an arm here, not registering into shared mutable state.

use std::sync::Arc;

use crate::config::AiConfig;
use crate::error::{AgentError, Result};
use crate::llm::deepseek::DeepSeekProvider;
use crate::llm::openai::OpenAiProvider;
use crate::llm::provider::LlmProvider;

/// Names accepted in [`AiConfig::provider`].
pub fn available_providers() -> Vec<&'static str> {
    vec!["deepseek", "openai"]
}

/// Build the configured provider.
///
/// Fails fast at startup on an unknown provider name or a missing API key,
/// rather than on the first customer message.
pub fn provider_from_config(config: &AiConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.provider.as_str() {
        "deepseek" => Ok(Arc::new(DeepSeekProvider::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAiProvider::from_config(config)?)),
        other => Err(AgentError::UnknownProvider {
            name: other.to_owned(),
            available: available_providers().join(", "),
        }),
    }
}
