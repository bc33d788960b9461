//! The response orchestrator: one full customer turn.
//!
//! Turn shape: build context, call the LLM with tools, execute whatever it
//! requested (except escalation, which is signaling, not a side effect),
//! then narrate the results in a second tool-free call.  Any failure along
//! the way collapses into a fixed customer-safe fallback; this module's
//! public entry point never returns an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Local;

use crate::error::Result;
use crate::executor::{ToolExecutionResult, ToolExecutor};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{ChatMessage, CompletionRequest, CompletionResult, Role, ToolCall};
use crate::prompts::system::{PromptContext, build_system_prompt};
use crate::prompts::tools::{
    CHECK_APPOINTMENT_STATUS, ESCALATE_TO_HUMAN, REQUEST_CALLBACK, SCHEDULE_APPOINTMENT,
    ToolCapabilities, available_tools,
};
use crate::store::{EscalationPriority, SenderKind, StoredMessage};

/// Context window: most recent messages kept, oldest truncated.
const HISTORY_WINDOW: usize = 10;

const REPLY_TEMPERATURE: f32 = 0.7;
const REPLY_MAX_TOKENS: u32 = 500;

// The narrate call keeps a fixed temperature regardless of tenant style.
const NARRATE_TEMPERATURE: f32 = 0.7;
const NARRATE_MAX_TOKENS: u32 = 300;

const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble processing your request \
right now. Would you like me to have someone call you back?";

const NARRATE_INSTRUCTION: &str = "You just executed the following actions. Based on the \
results, provide a friendly, concise response to the customer. Don't mention 'tools' or \
'functions' - speak naturally.";

/// Escalation request extracted from an `escalate_to_human` call.
#[derive(Debug, Clone)]
pub struct Escalation {
    pub reason: String,
    pub priority: EscalationPriority,
}

/// Token and cost accounting for one turn.
#[derive(Debug, Clone)]
pub struct TurnUsage {
    pub tokens_used: u32,
    pub estimated_cost: f64,
    pub provider: String,
    pub model: String,
}

/// Everything one turn produced.
#[derive(Debug)]
pub struct OrchestrationResult {
    /// Final customer-facing reply.  Never empty.
    pub content: String,
    /// Raw tool calls from the model, including escalation.
    pub tool_calls: Vec<ToolCall>,
    /// True iff the model requested at least one tool call.
    pub requires_action: bool,
    /// Present iff the model requested `escalate_to_human`.
    pub escalation: Option<Escalation>,
    /// Executed tool results by tool name.  Never contains the escalation
    /// tool: that is signaling, handled by the policy layer.
    pub tool_results: BTreeMap<String, ToolExecutionResult>,
    pub usage: TurnUsage,
}

impl OrchestrationResult {
    pub fn should_escalate(&self) -> bool {
        self.escalation.is_some()
    }
}

/// Drives one customer turn against a provider and a tool executor.
pub struct ResponseOrchestrator {
    provider: Arc<dyn LlmProvider>,
    executor: ToolExecutor,
    prompt: PromptContext,
    tools: Vec<crate::llm::types::ToolDefinition>,
}

impl ResponseOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: ToolExecutor,
        capabilities: ToolCapabilities,
        prompt: PromptContext,
    ) -> Self {
        Self {
            provider,
            executor,
            prompt,
            tools: available_tools(capabilities),
        }
    }

    /// Generate the AI reply for one customer message.
    ///
    /// Total: any internal failure is logged and replaced by a fixed
    /// fallback offering a callback, with zeroed accounting.
    pub async fn generate_response(
        &self,
        history: &[StoredMessage],
        customer_message: &str,
        knowledge_context: Option<&str>,
    ) -> OrchestrationResult {
        match self.run_turn(history, customer_message, knowledge_context).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "AI turn failed, returning fallback reply");
                self.fallback_result()
            }
        }
    }

    async fn run_turn(
        &self,
        history: &[StoredMessage],
        customer_message: &str,
        knowledge_context: Option<&str>,
    ) -> Result<OrchestrationResult> {
        let system_prompt = build_system_prompt(&self.prompt, knowledge_context, Local::now());

        let mut messages = Vec::with_capacity(history.len().min(HISTORY_WINDOW) + 2);
        messages.push(ChatMessage::system(system_prompt));
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        for msg in &history[start..] {
            messages.push(ChatMessage {
                role: context_role(msg.sender),
                content: msg.content.clone(),
                name: None,
                tool_call_id: None,
            });
        }
        messages.push(ChatMessage::user(customer_message));

        let request = CompletionRequest::new(messages.clone(), REPLY_TEMPERATURE, REPLY_MAX_TOKENS)
            .with_tools(self.tools.clone());
        let first = self.provider.complete(request).await?;

        tracing::debug!(
            tool_calls = first.tool_calls.len(),
            tokens = first.total_tokens,
            "turn-1 completion received"
        );

        let escalation = extract_escalation(&first.tool_calls);
        let requires_action = first.has_tool_calls();

        let mut content = first.content.clone().unwrap_or_default();
        if content.is_empty() && requires_action {
            content = placeholder_for(&first.tool_calls).to_owned();
        }

        // Execute everything except escalation.  The narration summary
        // walks `tool_calls` in call order and looks results up by name.
        let mut tool_results = BTreeMap::new();
        for call in &first.tool_calls {
            if call.name == ESCALATE_TO_HUMAN {
                continue;
            }
            let result = self.executor.execute(call).await;
            tool_results.insert(call.name.clone(), result);
        }

        if !tool_results.is_empty() {
            if let Some(narration) = self.narrate(&messages, &first.tool_calls, &tool_results).await
            {
                content = narration;
            }
        }

        Ok(OrchestrationResult {
            content,
            requires_action,
            escalation,
            tool_results,
            usage: usage_of(&first),
            tool_calls: first.tool_calls,
        })
    }

    /// Second, tool-free call turning raw results into a natural reply.
    /// Failures here are absorbed: the step-3 placeholder is good enough.
    async fn narrate(
        &self,
        messages: &[ChatMessage],
        calls: &[ToolCall],
        results: &BTreeMap<String, ToolExecutionResult>,
    ) -> Option<String> {
        let mut summaries = Vec::new();
        for call in calls {
            let Some(result) = results.get(&call.name) else {
                continue;
            };
            let arguments =
                serde_json::to_string(&call.arguments).unwrap_or_else(|_| "{}".to_owned());
            summaries.push(format!(
                "Tool: {}\nArguments: {}\nResult: success={}, {}",
                call.name, arguments, result.success, result.message
            ));
        }
        if summaries.is_empty() {
            return None;
        }

        let mut follow_up = messages.to_vec();
        follow_up.push(ChatMessage::system(format!(
            "{NARRATE_INSTRUCTION}\n\n{}",
            summaries.join("\n\n")
        )));

        let request = CompletionRequest::new(follow_up, NARRATE_TEMPERATURE, NARRATE_MAX_TOKENS);
        match self.provider.complete(request).await {
            Ok(result) => result.content.filter(|c| !c.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "narration call failed, keeping placeholder reply");
                None
            }
        }
    }

    fn fallback_result(&self) -> OrchestrationResult {
        OrchestrationResult {
            content: FALLBACK_REPLY.to_owned(),
            tool_calls: Vec::new(),
            requires_action: false,
            escalation: None,
            tool_results: BTreeMap::new(),
            usage: TurnUsage {
                tokens_used: 0,
                estimated_cost: 0.0,
                provider: self.provider.provider_name().to_owned(),
                model: self.provider.model().to_owned(),
            },
        }
    }
}

/// Stored senders mapped onto LLM context roles.  Anything that is not
/// clearly assistant-authored reads as the user side of the dialogue.
fn context_role(sender: SenderKind) -> Role {
    match sender {
        SenderKind::Ai | SenderKind::Agent => Role::Assistant,
        SenderKind::Customer | SenderKind::System => Role::User,
    }
}

fn extract_escalation(calls: &[ToolCall]) -> Option<Escalation> {
    let call = calls.iter().find(|c| c.name == ESCALATE_TO_HUMAN)?;
    let reason = call
        .argument_str("reason")
        .filter(|r| !r.is_empty())
        .unwrap_or("Customer requested human agent")
        .to_owned();
    let priority = call
        .argument_str("priority")
        .map(EscalationPriority::from_wire)
        .unwrap_or_default();
    Some(Escalation { reason, priority })
}

/// Placeholder acknowledgment when the model emits tool calls without any
/// narrative content.  Keyed by the first recognized tool name.
fn placeholder_for(calls: &[ToolCall]) -> &'static str {
    for call in calls {
        match call.name.as_str() {
            SCHEDULE_APPOINTMENT => return "Let me schedule that appointment for you...",
            CHECK_APPOINTMENT_STATUS => return "Let me look up your appointment...",
            REQUEST_CALLBACK => return "I'll arrange for someone to call you back...",
            ESCALATE_TO_HUMAN => {
                return "I'm connecting you with a team member who can better assist you. \
One moment please...";
            }
            _ => continue,
        }
    }
    "One moment while I take care of that for you..."
}

fn usage_of(result: &CompletionResult) -> TurnUsage {
    TurnUsage {
        tokens_used: result.total_tokens,
        estimated_cost: result.estimated_cost,
        provider: result.provider.clone(),
        model: result.model.clone(),
    }
}
