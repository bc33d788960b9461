//! DeepSeek provider (OpenAI-compatible chat completions).

use std::time::Duration;

use async_trait::async_trait;

use crate::config::AiConfig;
use crate::error::{AgentError, Result};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CompletionRequest, CompletionResult};
use crate::llm::wire;

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

// USD per million tokens.  DeepSeek bills cache hits at a reduced input rate
// and reports them as `prompt_cache_hit_tokens`.
const INPUT_PER_M: f64 = 0.27;
const CACHED_INPUT_PER_M: f64 = 0.07;
const OUTPUT_PER_M: f64 = 1.10;

#[derive(Debug)]
pub struct DeepSeekProvider {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl DeepSeekProvider {
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
                provider: "deepseek".into(),
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

    fn estimate_cost(&self, prompt_tokens: u32, cached_tokens: u32, completion_tokens: u32) -> f64 {
        let uncached = prompt_tokens.saturating_sub(cached_tokens);
        (f64::from(uncached) * INPUT_PER_M
            + f64::from(cached_tokens) * CACHED_INPUT_PER_M
            + f64::from(completion_tokens) * OUTPUT_PER_M)
            / 1_000_000.0
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn provider_name(&self) -> &'static str {
        "deepseek"
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
            "deepseek completion request"
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
                reason: format!("deepseek returned {status}: {detail}"),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let parsed = wire::parse_completion(&payload)?;
        let estimated_cost = self.estimate_cost(
            parsed.prompt_tokens,
            parsed.cached_prompt_tokens,
            parsed.completion_tokens,
        );

        Ok(CompletionResult {
            content: parsed.content,
            tool_calls: parsed.tool_calls,
            finish_reason: parsed.finish_reason,
            prompt_tokens: parsed.prompt_tokens,
            completion_tokens: parsed.completion_tokens,
            total_tokens: parsed.prompt_tokens + parsed.completion_tokens,
            estimated_cost,
            provider: "deepseek".into(),
            model: self.model.clone(),
        })
    }
}
