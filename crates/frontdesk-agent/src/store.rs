//! Conversation persistence collaborator interface.
//!
//! The pipeline never talks to a database.  It reads recent history and
//! tenant settings through this trait and pushes its mutations (messages,
//! escalation marks) back through it.  Serialization to storage strings
//! happens behind the trait; internal code works with the enums only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Canonical enums
// ---------------------------------------------------------------------------

/// Who authored a stored conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Customer,
    /// A human agent.
    Agent,
    Ai,
    System,
}

/// Tenant-configured tone for AI replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    #[default]
    Professional,
    Friendly,
    Casual,
    Formal,
}

impl ResponseStyle {
    /// Prompt fragment appended for this style.
    pub fn instruction(&self) -> &'static str {
        match self {
            ResponseStyle::Professional => "Maintain a professional, business-like tone.",
            ResponseStyle::Friendly => {
                "Be warm, friendly, and approachable. Use casual language."
            }
            ResponseStyle::Casual => "Be relaxed and conversational. It's okay to be informal.",
            ResponseStyle::Formal => {
                "Use formal, polished language. Be very proper and respectful."
            }
        }
    }
}

/// Escalation urgency, as the LLM or policy layer sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl EscalationPriority {
    /// Parse a priority string from tool-call arguments; anything
    /// unrecognized is treated as normal rather than rejected.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "low" => EscalationPriority::Low,
            "normal" => EscalationPriority::Normal,
            "high" => EscalationPriority::High,
            "urgent" => EscalationPriority::Urgent,
            _ => EscalationPriority::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationPriority::Low => "low",
            EscalationPriority::Normal => "normal",
            EscalationPriority::High => "high",
            EscalationPriority::Urgent => "urgent",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A message as read back for LLM context: sender and text only.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub sender: SenderKind,
    pub content: String,
}

/// A persisted message, as returned after an append.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: SenderKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Per-tenant AI configuration, business-controlled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantAiSettings {
    pub enabled: bool,
    pub response_style: ResponseStyle,
    /// Confidence threshold for future auto-escalation; carried through and
    /// logged, not consumed by any decision yet.
    pub escalation_threshold: f32,
    pub max_ai_turns: u32,
    pub custom_instructions: Option<String>,
}

impl Default for TenantAiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            response_style: ResponseStyle::Professional,
            escalation_threshold: 0.7,
            max_ai_turns: 5,
            custom_instructions: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Conversation reads and mutations the turn policy needs.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The most recent `limit` messages, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<StoredMessage>>;

    /// How many AI-authored messages this conversation already holds.
    async fn count_ai_messages(&self, conversation_id: Uuid) -> Result<u32>;

    async fn tenant_ai_settings(&self, tenant_id: Uuid) -> Result<TenantAiSettings>;

    /// Flip the conversation to human-handled/pending with the given
    /// priority.
    async fn mark_escalated(
        &self,
        conversation_id: Uuid,
        reason: &str,
        priority: EscalationPriority,
    ) -> Result<()>;

    /// Append a message; `metadata` carries the turn's accounting payload
    /// for AI messages.
    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender: SenderKind,
        content: &str,
        metadata: Option<Value>,
    ) -> Result<MessageRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_from_wire_defaults_to_normal() {
        assert_eq!(EscalationPriority::from_wire("urgent"), EscalationPriority::Urgent);
        assert_eq!(EscalationPriority::from_wire("ASAP"), EscalationPriority::Normal);
        assert_eq!(EscalationPriority::from_wire(""), EscalationPriority::Normal);
    }

    #[test]
    fn styles_serialize_lowercase() {
        let v = serde_json::to_value(ResponseStyle::Friendly).unwrap();
        assert_eq!(v, serde_json::json!("friendly"));
        let back: ResponseStyle = serde_json::from_value(v).unwrap();
        assert_eq!(back, ResponseStyle::Friendly);
    }

    #[test]
    fn every_style_has_an_instruction() {
        for style in [
            ResponseStyle::Professional,
            ResponseStyle::Friendly,
            ResponseStyle::Casual,
            ResponseStyle::Formal,
        ] {
            assert!(!style.instruction().is_empty());
        }
    }
}
