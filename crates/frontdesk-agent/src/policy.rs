//! Conversation turn policy: the tenant-gating wrapper around the
//! orchestrator.
//!
//! Runs before any LLM call: an AI-disabled tenant is routed straight to a
//! human, and a conversation that has used up its AI turn allowance trips
//! the circuit breaker unconditionally.  After the orchestrator returns,
//! this layer owns the escalation side effects and the accounting metadata;
//! the orchestrator itself never touches conversation state.

use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use crate::crm::CrmConnector;
use crate::error::Result;
use crate::executor::ToolExecutor;
use crate::kb::KnowledgeBase;
use crate::llm::provider::LlmProvider;
use crate::orchestrator::{OrchestrationResult, ResponseOrchestrator};
use crate::prompts::system::PromptContext;
use crate::prompts::tools::ToolCapabilities;
use crate::store::{
    ConversationStore, EscalationPriority, MessageRecord, SenderKind, TenantAiSettings,
};

/// Context window passed to the store when loading history.
const HISTORY_LIMIT: usize = 10;

const KB_MAX_ARTICLES: usize = 3;
const KB_MAX_CHARS: usize = 2000;

const AI_DISABLED_REPLY: &str = "A team member will be with you shortly.";

const HANDOFF_REPLY: &str = "I think it would be best to connect you with one of our team \
members who can better assist you. Someone will be with you shortly!";

/// Which tenant a turn belongs to.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub business_name: String,
}

/// What one handled turn persisted.
#[derive(Debug)]
pub struct TurnOutcome {
    pub customer_message: MessageRecord,
    /// The reply, AI- or system-authored.  Always present: even total AI
    /// failure produces a fallback message.
    pub reply: MessageRecord,
}

/// Tenant-aware entry point for inbound customer messages.
pub struct TurnPolicy {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn LlmProvider>,
    crm: Option<Arc<dyn CrmConnector>>,
    kb: Option<Arc<dyn KnowledgeBase>>,
    capabilities: ToolCapabilities,
}

impl TurnPolicy {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn LlmProvider>,
        crm: Option<Arc<dyn CrmConnector>>,
        kb: Option<Arc<dyn KnowledgeBase>>,
        capabilities: ToolCapabilities,
    ) -> Self {
        Self {
            store,
            provider,
            crm,
            kb,
            capabilities,
        }
    }

    /// Handle one inbound customer message end to end: persist it, apply
    /// tenant gating, run the orchestrator if allowed, persist the reply.
    ///
    /// Errors here come only from the persistence collaborator; the AI path
    /// itself is total.
    pub async fn handle_customer_message(
        &self,
        tenant: &TenantContext,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<TurnOutcome> {
        let customer_message = self
            .store
            .append_message(conversation_id, SenderKind::Customer, content, None)
            .await?;

        let settings = self.store.tenant_ai_settings(tenant.tenant_id).await?;

        if !settings.enabled {
            tracing::info!(tenant = %tenant.tenant_id, "AI disabled, routing to human");
            self.escalate(conversation_id, "AI responses disabled", EscalationPriority::Normal)
                .await?;
            let reply = self
                .store
                .append_message(conversation_id, SenderKind::System, AI_DISABLED_REPLY, None)
                .await?;
            return Ok(TurnOutcome {
                customer_message,
                reply,
            });
        }

        // Circuit breaker: independent of anything the LLM would decide.
        let ai_turn_count = self.store.count_ai_messages(conversation_id).await?;
        if ai_turn_count >= settings.max_ai_turns {
            tracing::info!(
                conversation = %conversation_id,
                turns = ai_turn_count,
                max = settings.max_ai_turns,
                "max AI turns reached, forcing hand-off"
            );
            self.escalate(
                conversation_id,
                &format!("Maximum AI turns ({}) reached", settings.max_ai_turns),
                EscalationPriority::Normal,
            )
            .await?;
            let reply = self
                .store
                .append_message(conversation_id, SenderKind::Ai, HANDOFF_REPLY, None)
                .await?;
            return Ok(TurnOutcome {
                customer_message,
                reply,
            });
        }

        let history = self
            .store
            .recent_messages(conversation_id, HISTORY_LIMIT)
            .await?;
        let knowledge_context = self.knowledge_context(tenant.tenant_id, content).await;

        let prompt = PromptContext {
            business_name: tenant.business_name.clone(),
            style_instruction: Some(settings.response_style.instruction().to_owned()),
            custom_instructions: settings.custom_instructions.clone(),
        };
        let executor = ToolExecutor::new(tenant.tenant_id, self.crm.clone(), self.kb.clone());
        let orchestrator = ResponseOrchestrator::new(
            self.provider.clone(),
            executor,
            self.capabilities,
            prompt,
        );

        let result = orchestrator
            .generate_response(&history, content, knowledge_context.as_deref())
            .await;

        if let Some(escalation) = &result.escalation {
            self.escalate(conversation_id, &escalation.reason, escalation.priority)
                .await?;
        }

        let metadata = turn_metadata(&result, &settings, ai_turn_count + 1);
        let reply = self
            .store
            .append_message(conversation_id, SenderKind::Ai, &result.content, Some(metadata))
            .await?;

        for (name, tool_result) in &result.tool_results {
            tracing::info!(
                tool = %name,
                success = tool_result.success,
                "tool execution: {}",
                tool_result.message
            );
        }
        tracing::info!(
            tokens = result.usage.tokens_used,
            cost = result.usage.estimated_cost,
            provider = %result.usage.provider,
            style = ?settings.response_style,
            turn = ai_turn_count + 1,
            max_turns = settings.max_ai_turns,
            "AI response generated"
        );

        Ok(TurnOutcome {
            customer_message,
            reply,
        })
    }

    /// Best-effort knowledge lookup; a KB failure never blocks the turn.
    async fn knowledge_context(&self, tenant_id: Uuid, query: &str) -> Option<String> {
        let kb = self.kb.as_ref()?;
        match kb
            .context_for_query(tenant_id, query, KB_MAX_ARTICLES, KB_MAX_CHARS)
            .await
        {
            Ok(excerpt) => excerpt,
            Err(err) => {
                tracing::warn!(error = %err, "knowledge lookup failed, continuing without excerpt");
                None
            }
        }
    }

    /// Escalation side effects: flip the conversation to human handling and
    /// leave a system note for the agent who picks it up.
    async fn escalate(
        &self,
        conversation_id: Uuid,
        reason: &str,
        priority: EscalationPriority,
    ) -> Result<()> {
        self.store
            .mark_escalated(conversation_id, reason, priority)
            .await?;
        let note = format!("Conversation escalated to human agent. Reason: {reason}");
        self.store
            .append_message(conversation_id, SenderKind::System, &note, None)
            .await?;
        tracing::info!(conversation = %conversation_id, reason, "conversation escalated");
        Ok(())
    }
}

/// Accounting payload attached to the persisted AI message.
fn turn_metadata(
    result: &OrchestrationResult,
    settings: &TenantAiSettings,
    ai_turn: u32,
) -> Value {
    let tool_calls: Vec<Value> = result
        .tool_calls
        .iter()
        .map(|tc| json!({"name": tc.name, "arguments": tc.arguments}))
        .collect();

    let mut metadata = json!({
        "tokens_used": result.usage.tokens_used,
        "estimated_cost": result.usage.estimated_cost,
        "provider": result.usage.provider,
        "model": result.usage.model,
        "response_style": settings.response_style,
        "escalation_threshold": settings.escalation_threshold,
        "ai_turn": ai_turn,
        "max_ai_turns": settings.max_ai_turns,
        "tool_calls": tool_calls,
    });
    if !result.tool_results.is_empty() {
        let results: serde_json::Map<String, Value> = result
            .tool_results
            .iter()
            .map(|(name, r)| {
                (
                    name.clone(),
                    json!({
                        "success": r.success,
                        "message": r.message,
                        "data": r.data,
                        "error": r.error,
                    }),
                )
            })
            .collect();
        metadata["tool_results"] = Value::Object(results);
    }
    metadata
}
