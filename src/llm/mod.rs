//! LLM Client Layer - Groq API integration and tool-call parsing
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - GroqClient implementation (OpenAI-compatible chat completions)
//! - Tool call parsing and input validation

pub mod client;
pub mod groq;
pub mod tool_parser;
pub mod types;

pub use client::{LlmClient, MockLlmClient};
pub use groq::{GroqClient, GroqConfig};
pub use tool_parser::{needs_tool_execution, parse_response, validate_tool_input};
pub use types::{
    CompletionRequest, CompletionResponse, FinishReason, Message, Role, ToolCall, ToolDefinition,
    ToolResult, Usage,
};
