//! The static tool catalog.
//!
//! Definitions are fixed at process start; tenants get a narrower surface
//! through [`ToolCapabilities`] flags, never through edited definitions.

use serde_json::json;

use crate::llm::types::ToolDefinition;

// Tool names, shared with the executor and orchestrator so dispatch never
// repeats string literals.
pub const SCHEDULE_APPOINTMENT: &str = "schedule_appointment";
pub const CHECK_APPOINTMENT_STATUS: &str = "check_appointment_status";
pub const REQUEST_CALLBACK: &str = "request_callback";
pub const SEARCH_KNOWLEDGE_BASE: &str = "search_knowledge_base";
pub const ESCALATE_TO_HUMAN: &str = "escalate_to_human";

/// Which tool groups a tenant's conversations may use.
#[derive(Debug, Clone, Copy)]
pub struct ToolCapabilities {
    /// schedule_appointment, check_appointment_status, request_callback.
    pub scheduling: bool,
    pub knowledge_base: bool,
    pub escalation: bool,
}

impl Default for ToolCapabilities {
    fn default() -> Self {
        Self {
            scheduling: true,
            knowledge_base: true,
            escalation: true,
        }
    }
}

fn schedule_appointment() -> ToolDefinition {
    ToolDefinition {
        name: SCHEDULE_APPOINTMENT.into(),
        description: "Schedule a service appointment for the customer. Use this when the \
customer wants to book a service visit. You need to collect: customer name, phone number, \
service type, and preferred time window."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "customer_name": {
                    "type": "string",
                    "description": "Customer's full name",
                },
                "phone": {
                    "type": "string",
                    "description": "Customer's phone number",
                },
                "service_type": {
                    "type": "string",
                    "description": "Type of service needed (e.g., 'AC repair', 'installation quote')",
                },
                "preferred_date": {
                    "type": "string",
                    "description": "Preferred date (e.g., 'tomorrow', 'Monday', '2024-12-15')",
                },
                "preferred_time": {
                    "type": "string",
                    "description": "Preferred time window (e.g., 'morning', 'afternoon', '9am-12pm')",
                },
                "issue_description": {
                    "type": "string",
                    "description": "Brief description of the issue or service needed",
                },
                "address": {
                    "type": "string",
                    "description": "Service address if different from customer's default",
                },
            },
            "required": ["customer_name", "phone", "service_type"],
        }),
    }
}

fn check_appointment_status() -> ToolDefinition {
    ToolDefinition {
        name: CHECK_APPOINTMENT_STATUS.into(),
        description: "Look up the status of an existing appointment. Use this when a \
customer asks about their scheduled appointment."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "phone": {
                    "type": "string",
                    "description": "Customer's phone number to look up",
                },
                "name": {
                    "type": "string",
                    "description": "Customer's name (optional, helps with lookup)",
                },
            },
            "required": ["phone"],
        }),
    }
}

fn request_callback() -> ToolDefinition {
    ToolDefinition {
        name: REQUEST_CALLBACK.into(),
        description: "Request a callback from the business. Use this when a customer wants \
to speak with someone but doesn't need immediate service."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "customer_name": {
                    "type": "string",
                    "description": "Customer's name",
                },
                "phone": {
                    "type": "string",
                    "description": "Phone number to call back",
                },
                "reason": {
                    "type": "string",
                    "description": "Brief reason for callback (e.g., 'quote for new AC', 'billing question')",
                },
                "best_time": {
                    "type": "string",
                    "description": "Best time to call (optional)",
                },
            },
            "required": ["customer_name", "phone", "reason"],
        }),
    }
}

fn search_knowledge_base() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_KNOWLEDGE_BASE.into(),
        description: "Search the knowledge base for information. Use this to find specific \
information about services, pricing, policies, etc."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (e.g., 'maintenance plan pricing', 'service area')",
                },
            },
            "required": ["query"],
        }),
    }
}

fn escalate_to_human() -> ToolDefinition {
    ToolDefinition {
        name: ESCALATE_TO_HUMAN.into(),
        description: "Transfer the conversation to a human agent. Use this when: the \
customer explicitly asks to speak to a human; the issue is too complex for AI; the \
customer is frustrated or upset; there is an emergency; or the request requires account \
access or sensitive information."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Why this needs human attention",
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "normal", "high", "urgent"],
                    "description": "How urgent is this escalation",
                },
                "summary": {
                    "type": "string",
                    "description": "Brief summary of the conversation so far for the agent",
                },
            },
            "required": ["reason", "priority", "summary"],
        }),
    }
}

/// The filtered catalog for one tenant.
pub fn available_tools(capabilities: ToolCapabilities) -> Vec<ToolDefinition> {
    let mut tools = Vec::new();
    if capabilities.scheduling {
        tools.push(schedule_appointment());
        tools.push(check_appointment_status());
        tools.push(request_callback());
    }
    if capabilities.knowledge_base {
        tools.push(search_knowledge_base());
    }
    if capabilities.escalation {
        tools.push(escalate_to_human());
    }
    tools
}
