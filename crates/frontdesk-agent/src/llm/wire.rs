//! OpenAI-compatible wire encoding.
//!
//! Both supported vendors speak the same chat-completions dialect, so the
//! request body construction and response parsing live here once.  Providers
//! differ only in endpoint, auth, and pricing.

use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::types::{ChatMessage, CompletionRequest, FinishReason, ToolCall, ToolDefinition};

/// Build the JSON body for a `/chat/completions` request.
pub(crate) fn build_request_body(model: &str, request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages_to_wire(&request.messages),
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": false,
    });
    if !request.tools.is_empty() {
        body["tools"] = tools_to_wire(&request.tools);
        body["tool_choice"] = json!("auto");
    }
    body
}

fn messages_to_wire(messages: &[ChatMessage]) -> Value {
    let wire: Vec<Value> = messages
        .iter()
        .map(|m| {
            let mut obj = json!({
                "role": m.role.as_str(),
                "content": m.content,
            });
            if let Some(name) = &m.name {
                obj["name"] = json!(name);
            }
            if let Some(id) = &m.tool_call_id {
                obj["tool_call_id"] = json!(id);
            }
            obj
        })
        .collect();
    Value::Array(wire)
}

fn tools_to_wire(tools: &[ToolDefinition]) -> Value {
    let wire: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                },
            })
        })
        .collect();
    Value::Array(wire)
}

/// A parsed chat-completions response, before cost attribution.
#[derive(Debug)]
pub(crate) struct ParsedCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Prompt tokens served from the provider cache (DeepSeek reports these
    /// as `prompt_cache_hit_tokens`; OpenAI-style responses omit the field).
    pub cached_prompt_tokens: u32,
}

/// Parse a `/chat/completions` response body.
pub(crate) fn parse_completion(body: &Value) -> Result<ParsedCompletion> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "response has no choices[0].message".into(),
        })?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().map(parse_tool_call).collect())
        .unwrap_or_default();

    let finish_reason = body["choices"][0]
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(FinishReason::from_wire)
        .unwrap_or(FinishReason::Other);

    let usage = body.get("usage");
    let usage_u32 = |key: &str| -> u32 {
        usage
            .and_then(|u| u.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    };

    Ok(ParsedCompletion {
        content,
        tool_calls,
        finish_reason,
        prompt_tokens: usage_u32("prompt_tokens"),
        completion_tokens: usage_u32("completion_tokens"),
        cached_prompt_tokens: usage_u32("prompt_cache_hit_tokens"),
    })
}

fn parse_tool_call(call: &Value) -> ToolCall {
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let function = &call["function"];
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    // Arguments arrive as a JSON string.  A model can emit garbage here;
    // treat that as "no arguments" so one bad call never kills the turn.
    let raw = function.get("arguments").and_then(Value::as_str).unwrap_or("{}");
    let arguments = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(tool = %name, "malformed tool call arguments; treating as empty");
            serde_json::Map::new()
        }
    };

    ToolCall { id, name, arguments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_tools() -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user("hi")], 0.7, 500).with_tools(vec![
            ToolDefinition {
                name: "schedule_appointment".into(),
                description: "Schedule a service appointment".into(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        ])
    }

    #[test]
    fn body_includes_tools_only_when_present() {
        let with = build_request_body("deepseek-chat", &request_with_tools());
        assert_eq!(with["tool_choice"], json!("auto"));
        assert_eq!(with["tools"][0]["type"], json!("function"));
        assert_eq!(with["stream"], json!(false));

        let bare = CompletionRequest::new(vec![ChatMessage::user("hi")], 0.7, 300);
        let without = build_request_body("deepseek-chat", &bare);
        assert!(without.get("tools").is_none());
        assert!(without.get("tool_choice").is_none());
    }

    #[test]
    fn parses_text_response() {
        let body = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop",
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15},
        });
        let parsed = parse_completion(&body).unwrap();
        assert_eq!(parsed.content.as_deref(), Some("Hello!"));
        assert!(parsed.tool_calls.is_empty());
        assert_eq!(parsed.finish_reason, FinishReason::Stop);
        assert_eq!(parsed.prompt_tokens, 12);
        assert_eq!(parsed.completion_tokens, 3);
        assert_eq!(parsed.cached_prompt_tokens, 0);
    }

    #[test]
    fn parses_tool_calls_and_cached_tokens() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "schedule_appointment",
                            "arguments": "{\"customer_name\": \"Ana\", \"phone\": \"555-0100\"}",
                        },
                    }],
                },
                "finish_reason": "tool_calls",
            }],
            "usage": {
                "prompt_tokens": 100,
                "completion_tokens": 20,
                "prompt_cache_hit_tokens": 64,
            },
        });
        let parsed = parse_completion(&body).unwrap();
        assert!(parsed.content.is_none());
        assert_eq!(parsed.finish_reason, FinishReason::ToolCalls);
        assert_eq!(parsed.cached_prompt_tokens, 64);
        let call = &parsed.tool_calls[0];
        assert_eq!(call.name, "schedule_appointment");
        assert_eq!(call.argument_str("customer_name"), Some("Ana"));
    }

    #[test]
    fn malformed_arguments_become_empty_map() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "request_callback", "arguments": "{not json"},
                    }],
                },
                "finish_reason": "tool_calls",
            }],
        });
        let parsed = parse_completion(&body).unwrap();
        assert!(parsed.tool_calls[0].arguments.is_empty());
    }

    #[test]
    fn missing_choices_is_a_parse_error() {
        let err = parse_completion(&json!({"usage": {}})).unwrap_err();
        assert!(err.to_string().contains("choices"));
    }
}
