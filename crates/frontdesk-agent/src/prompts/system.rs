//! System prompt assembly.
//!
//! The prompt is built in a fixed order: persona, wall-clock time, the
//! knowledge block (or the no-knowledge rules), then the tenant's free-text
//! instructions last.  Tenant text comes after the grounding rules so it can
//! refine tone but cannot displace the "don't invent facts" section above it.

use chrono::{DateTime, Local};

/// Static, per-tenant inputs to the prompt.  The knowledge excerpt varies by
/// turn and is passed to [`build_system_prompt`] separately.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub business_name: String,
    /// Tone fragment derived from the tenant's response style setting.
    pub style_instruction: Option<String>,
    /// Free-text instructions written by the business owner.
    pub custom_instructions: Option<String>,
}

impl PromptContext {
    pub fn for_business(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
            ..Self::default()
        }
    }
}

fn base_persona(business_name: &str) -> String {
    format!(
        "You are a helpful, friendly customer service assistant for {business_name}, \
a local business. Help customers with their questions, scheduling requests, and \
general inquiries.

## Core Principles

1. **Be Helpful**: Always try to answer the customer's question or help them accomplish their goal.
2. **Be Concise**: Keep responses brief. Use short paragraphs, 2-3 sentences max.
3. **Be Honest**: If you don't know something or can't help, say so clearly and offer alternatives.
4. **Know Your Limits**: If a request requires human intervention (complex complaints, emergencies, negotiations), escalate promptly.

## Things You Must NOT Do

- Make promises about pricing, warranties, or guarantees you cannot verify
- Share other customers' information
- Provide medical, legal, or financial advice
- Handle emergencies (direct the customer to 911 or emergency services)
- Process refunds or payments directly"
    )
}

fn knowledge_block(excerpt: &str) -> String {
    format!(
        "## Verified Business Information

Use ONLY the information between the markers below when answering questions about \
services, pricing, hours, or policies.

---BEGIN BUSINESS INFORMATION---
{excerpt}
---END BUSINESS INFORMATION---

If the answer is not covered above, say you are not certain and offer to have \
someone from the team follow up. Never invent prices, hours, or service areas."
    )
}

const NO_KNOWLEDGE_BLOCK: &str = "## No Business Information Available

You do not have verified details about this business's services, pricing, hours, \
or policies. Do not guess or improvise them. For any such question, collect the \
customer's name and phone number and offer to have someone call them back with \
the answer.";

/// Assemble the full system prompt for one turn.
pub fn build_system_prompt(
    context: &PromptContext,
    knowledge_excerpt: Option<&str>,
    now: DateTime<Local>,
) -> String {
    let mut parts = vec![base_persona(&context.business_name)];

    parts.push(format!(
        "## Current Time\n\nIt is currently {}. Use this for scheduling context.",
        now.format("%A, %B %d, %Y at %I:%M %p")
    ));

    match knowledge_excerpt {
        Some(excerpt) => parts.push(knowledge_block(excerpt)),
        None => parts.push(NO_KNOWLEDGE_BLOCK.to_owned()),
    }

    if let Some(style) = &context.style_instruction {
        parts.push(format!("## Response Style\n\n{style}"));
    }

    // Tenant text stays last.
    if let Some(custom) = &context.custom_instructions {
        parts.push(format!("## Additional Business Instructions\n\n{custom}"));
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext {
        PromptContext {
            business_name: "Acme Heating".into(),
            style_instruction: Some("Be warm and conversational.".into()),
            custom_instructions: Some("We close at noon on Saturdays.".into()),
        }
    }

    #[test]
    fn knowledge_excerpt_is_delimited() {
        let prompt = build_system_prompt(&context(), Some("Hours: Mon-Fri 8-6"), Local::now());
        assert!(prompt.contains("---BEGIN BUSINESS INFORMATION---"));
        assert!(prompt.contains("Hours: Mon-Fri 8-6"));
        assert!(prompt.contains("---END BUSINESS INFORMATION---"));
        assert!(!prompt.contains("No Business Information Available"));
    }

    #[test]
    fn missing_excerpt_forbids_improvising() {
        let prompt = build_system_prompt(&context(), None, Local::now());
        assert!(prompt.contains("No Business Information Available"));
        assert!(prompt.contains("offer to have someone call them back"));
    }

    #[test]
    fn tenant_instructions_come_after_grounding_rules() {
        let prompt = build_system_prompt(&context(), Some("Hours: Mon-Fri 8-6"), Local::now());
        let rules = prompt.find("Never invent prices").unwrap();
        let custom = prompt.find("We close at noon on Saturdays.").unwrap();
        assert!(rules < custom);
        assert!(prompt.ends_with("We close at noon on Saturdays."));
    }

    #[test]
    fn business_name_appears_in_persona() {
        let prompt = build_system_prompt(&context(), None, Local::now());
        assert!(prompt.contains("Acme Heating"));
    }
}
