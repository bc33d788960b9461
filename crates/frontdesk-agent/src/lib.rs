//! # frontdesk-agent
//!
//! AI response pipeline for the Frontdesk helpdesk.  For each inbound
//! customer message it decides whether and how the AI replies, executes any
//! tools the model requests (scheduling, callbacks, knowledge search), folds
//! the results into a natural-language reply, and hands the conversation to
//! a human when asked or when the tenant's turn budget runs out.
//!
//! Layering, bottom up:
//!
//! - [`llm`] — provider-neutral chat types, the [`llm::LlmProvider`] trait,
//!   DeepSeek and OpenAI implementations, and the config factory.
//! - [`prompts`] — system prompt assembly and the static tool catalog.
//! - [`crm`], [`store`], [`kb`] — interfaces to the external collaborators
//!   (field-service CRM, conversation persistence, knowledge base).
//! - [`executor`] — typed tool dispatch with per-branch failure absorption.
//! - [`orchestrator`] — the act-then-narrate turn loop; its entry point
//!   never fails, degrading to a fixed callback offer instead.
//! - [`policy`] — tenant gating (AI enabled, max turns, response style) and
//!   escalation side effects.

pub mod config;
pub mod crm;
pub mod error;
pub mod executor;
pub mod kb;
pub mod llm;
pub mod orchestrator;
pub mod policy;
pub mod prompts;
pub mod store;

pub use config::AiConfig;
pub use error::{AgentError, Result};
pub use executor::{ToolAction, ToolExecutionResult, ToolExecutor};
pub use llm::{LlmProvider, provider_from_config};
pub use orchestrator::{Escalation, OrchestrationResult, ResponseOrchestrator, TurnUsage};
pub use policy::{TenantContext, TurnOutcome, TurnPolicy};
pub use prompts::{PromptContext, ToolCapabilities};
pub use store::{
    ConversationStore, EscalationPriority, MessageRecord, ResponseStyle, SenderKind,
    StoredMessage, TenantAiSettings,
};
