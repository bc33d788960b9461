//! LLM provider abstraction: neutral chat types, the [`LlmProvider`] trait,
//! vendor implementations, and the config-driven factory.

pub mod deepseek;
pub mod factory;
pub mod openai;
pub mod provider;
pub mod types;
mod wire;

pub use deepseek::DeepSeekProvider;
pub use factory::{available_providers, provider_from_config};
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use types::{
    ChatMessage, CompletionRequest, CompletionResult, FinishReason, Role, ToolCall,
    ToolDefinition,
};
