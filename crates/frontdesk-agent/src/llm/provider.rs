//! The provider abstraction every vendor implements.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{ChatMessage, CompletionRequest, CompletionResult};

/// A chat-completion backend.
///
/// Implementations own their HTTP client, API key, and pricing table, and
/// return fully normalized [`CompletionResult`]s — callers never see vendor
/// payloads.  Implementors must be cheap to share behind an `Arc`.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Stable provider identifier, e.g. `"deepseek"`.
    fn provider_name(&self) -> &'static str;

    /// The model this instance is bound to.
    fn model(&self) -> &str;

    /// Run one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult>;

    /// Cheap connectivity probe: one minimal completion, capped at a handful
    /// of tokens.  Never fails — an unreachable provider is just `false`.
    async fn health_check(&self) -> bool {
        let request = CompletionRequest::new(vec![ChatMessage::user("Hi")], 0.0, 5);
        match self.complete(request).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    provider = self.provider_name(),
                    error = %err,
                    "provider health check failed"
                );
                false
            }
        }
    }

    /// Rough token estimate for budgeting, about four characters per token.
    fn estimate_tokens(&self, text: &str) -> u32 {
        (text.len() / 4) as u32
    }
}
