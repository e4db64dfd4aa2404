//! Core LLM client trait and a scripted mock for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MedAgentError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse, FinishReason};

/// Stateless LLM client - each call is independent
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocks until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Whether the client is configured and usable
    fn is_ready(&self) -> bool;
}

/// Scripted LLM client for tests: pops pre-seeded responses in order and
/// records every request it receives.
#[derive(Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Create a mock with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return from the next `complete` call
    pub fn with_response(self, response: CompletionResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Queue a plain final-answer response
    pub fn with_final_text(self, text: impl Into<String>) -> Self {
        self.with_response(CompletionResponse {
            content: text.into(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Default::default(),
        })
    }

    /// Requests observed so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `complete` calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| MedAgentError::Llm("mock response script exhausted".to_string()))
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ToolCall;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_pops_in_order() {
        let mock = MockLlmClient::new()
            .with_response(CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall::new("c1", "cancer_db", json!({"query": "SELECT 1"}))],
                finish_reason: FinishReason::ToolCalls,
                usage: Default::default(),
            })
            .with_final_text("done");

        let first = mock.complete(CompletionRequest::new("sys")).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);

        let second = mock.complete(CompletionRequest::new("sys")).await.unwrap();
        assert_eq!(second.content, "done");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_exhausted_script_errors() {
        let mock = MockLlmClient::new();
        let err = mock.complete(CompletionRequest::new("sys")).await.unwrap_err();
        assert!(matches!(err, MedAgentError::Llm(_)));
    }

    #[test]
    fn test_mock_is_ready() {
        let mock = MockLlmClient::new();
        assert!(mock.is_ready());
        assert_eq!(mock.model(), "mock-model");
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockLlmClient::new().with_final_text("hi");
        mock.complete(CompletionRequest::new("system prompt").with_user_message("question"))
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "system prompt");
        assert_eq!(requests[0].messages.len(), 1);
    }
}
