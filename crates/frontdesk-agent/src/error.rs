//! Agent error types.
//!
//! All pipeline subsystems surface errors through [`AgentError`].  Failures
//! that have a customer-safe substitute (tool execution, CRM calls) are
//! absorbed below this layer and never appear here; these variants cover the
//! boundaries that genuinely fail.

/// Unified error type for the response pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// An HTTP request to the LLM provider failed.
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The LLM response could not be parsed into the expected format.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// The configured provider name does not match any known implementation.
    #[error("unknown llm provider: {name} (available: {available})")]
    UnknownProvider { name: String, available: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    // -- Collaborator errors -------------------------------------------------
    /// The conversation store collaborator failed.
    #[error("conversation store error: {reason}")]
    StoreFailed { reason: String },

    /// The knowledge base collaborator failed.
    #[error("knowledge base error: {reason}")]
    KnowledgeBaseFailed { reason: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // -- Generic -------------------------------------------------------------
    /// Catch-all for unexpected internal errors.  Prefer a typed variant
    /// whenever possible.
    #[error("internal agent error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::LlmRequestFailed {
            reason: err.to_string(),
        }
    }
}
