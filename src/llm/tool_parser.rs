//! Tool parser for extracting tool calls from Groq API responses
//!
//! Groq returns OpenAI-format chat completions: the assistant message lives
//! at `choices[0].message`, and each tool call carries its arguments as a
//! JSON-encoded *string* that has to be parsed separately.

use crate::error::{MedAgentError, Result};
use crate::llm::types::{CompletionResponse, FinishReason, ToolCall, ToolDefinition, Usage};
use serde_json::Value;

/// Parse a raw Groq chat-completion response into a CompletionResponse
pub fn parse_response(response: &Value) -> Result<CompletionResponse> {
    let choice = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| MedAgentError::Llm("response has no choices".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| MedAgentError::Llm("choice has no message".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|t| t.as_array()) {
        for call in calls {
            if let Some(parsed) = parse_tool_call(call) {
                tool_calls.push(parsed);
            }
        }
    }

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|s| s.as_str())
        .map(parse_finish_reason)
        .unwrap_or(FinishReason::Stop);

    let usage = response.get("usage").map(parse_usage).unwrap_or_default();

    Ok(CompletionResponse {
        content,
        tool_calls,
        finish_reason,
        usage,
    })
}

/// Parse a single tool_calls entry into a ToolCall
///
/// `function.arguments` is a JSON string per the OpenAI format. If it does
/// not parse, the raw string is preserved so input validation can reject the
/// call with a corrective observation instead of dropping it silently.
fn parse_tool_call(call: &Value) -> Option<ToolCall> {
    let id = call.get("id").and_then(|v| v.as_str())?.to_string();
    let function = call.get("function")?;
    let name = function.get("name").and_then(|v| v.as_str())?.to_string();

    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => {
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        Some(other) => other.clone(),
        None => Value::Object(Default::default()),
    };

    Some(ToolCall { id, name, arguments })
}

/// Parse a finish_reason string into the FinishReason enum
fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "tool_calls" => FinishReason::ToolCalls,
        "length" => FinishReason::Length,
        _ => FinishReason::Other,
    }
}

/// Parse the usage object from a response
fn parse_usage(usage: &Value) -> Usage {
    Usage {
        prompt_tokens: usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        completion_tokens: usage
            .get("completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
    }
}

/// Validate a tool call's arguments against a tool definition's schema
///
/// Checks that the arguments are a JSON object and that every required
/// field is present.
pub fn validate_tool_input(call: &ToolCall, definition: &ToolDefinition) -> Result<()> {
    if !call.arguments.is_object() {
        return Err(MedAgentError::Tool(format!(
            "Tool '{}' received non-object arguments: {}",
            call.name, call.arguments
        )));
    }

    if let Some(required) = definition.parameters.get("required").and_then(|r| r.as_array()) {
        for req in required {
            if let Some(field_name) = req.as_str() {
                if call.arguments.get(field_name).is_none() {
                    return Err(MedAgentError::Tool(format!(
                        "Tool '{}' missing required field: {}",
                        call.name, field_name
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Check whether a response is asking for tool execution
pub fn needs_tool_execution(response: &CompletionResponse) -> bool {
    !response.tool_calls.is_empty()
}
