//! OpenAI provider.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AiConfig;
use crate::error::{AgentError, Result};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CompletionRequest, CompletionResult};
use crate::llm::wire;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// USD per million tokens, (model prefix, input, output).  Unknown models are
// priced at the gpt-4o-mini tier so cost stays a lower bound, never zero.
const PRICING: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4-turbo", 10.00, 30.00),
];

fn pricing_for(model: &str) -> (f64, f64) {
    PRICING
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
        .unwrap_or((PRICING[0].1, PRICING[0].2))
}

#[derive(Debug)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self> {
        Self::with_options(api_key.into(), model, None, Duration::from_secs(60))
    }

    pub fn from_config(config: &AiConfig) -> Result<Self> {
        Self::with_options(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn with_options(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: "openai".into(),
            });
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            http,
        })
    }

    fn estimate_cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        let (input, output) = pricing_for(&self.model);
        (f64::from(prompt_tokens) * input + f64::from(completion_tokens) * output) / 1_000_000.0
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult> {
        let body = wire::build_request_body(&self.model, &request);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "openai completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmRequestFailed {
                reason: format!("openai returned {status}: {detail}"),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let parsed = wire::parse_completion(&payload)?;
        let estimated_cost = self.estimate_cost(parsed.prompt_tokens, parsed.completion_tokens);

        Ok(CompletionResult {
            content: parsed.content,
            tool_calls: parsed.tool_calls,
            finish_reason: parsed.finish_reason,
            prompt_tokens: parsed.prompt_tokens,
            completion_tokens: parsed.completion_tokens,
            total_tokens: parsed.prompt_tokens + parsed.completion_tokens,
            estimated_cost,
            provider: "openai".into(),
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenAiProvider::new("", None).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey { .. }));
    }

    #[test]
    fn pricing_matches_known_models() {
        assert_eq!(pricing_for("gpt-4o-mini"), (0.15, 0.60));
        assert_eq!(pricing_for("gpt-4o"), (2.50, 10.00));
        assert_eq!(pricing_for("gpt-4-turbo"), (10.00, 30.00));
    }

    #[test]
    fn unknown_model_falls_back_to_cheapest_tier() {
        assert_eq!(pricing_for("gpt-5-experimental"), (0.15, 0.60));
    }

    #[test]
    fn cost_uses_model_tier() {
        let mini = OpenAiProvider::new("sk-test", None).unwrap();
        let cost = mini.estimate_cost(1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-9);

        let full = OpenAiProvider::new("sk-test", Some("gpt-4o".into())).unwrap();
        let cost = full.estimate_cost(1_000_000, 1_000_000);
        assert!((cost - 12.50).abs() < 1e-9);
    }
}
