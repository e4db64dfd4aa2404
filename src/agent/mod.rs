//! Routing agent - the THINK/ACT/OBSERVE loop over the fixed tool set.
//!
//! Each question runs with fresh conversation state. The model decides which
//! tools to call from their descriptions; dispatch goes through the ToolId
//! router, and every tool outcome (including errors) is fed back as an
//! observation so the model can correct itself within the step budget.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::Result;
use crate::llm::{CompletionRequest, LlmClient, Message, Usage};
use crate::tools::{Tool, ToolRouter};

/// Final answer plus loop accounting for one question.
#[derive(Debug, Clone)]
pub struct AgentAnswer {
    pub text: String,
    pub steps: u32,
    pub usage: Usage,
}

/// Agent that routes a user question through the tools to a final answer.
pub struct RoutingAgent<L, T>
where
    L: LlmClient,
    T: ToolRouter,
{
    llm: Arc<L>,
    router: Arc<T>,
    system_prompt: String,
    max_steps: u32,
}

impl<L, T> RoutingAgent<L, T>
where
    L: LlmClient,
    T: ToolRouter,
{
    /// Create an agent over the given client and router.
    pub fn new(llm: Arc<L>, router: Arc<T>, max_steps: u32) -> Self {
        let system_prompt = build_system_prompt(router.tools());
        Self {
            llm,
            router,
            system_prompt,
            max_steps: max_steps.max(1),
        }
    }

    /// Answer one question, running up to `max_steps` THINK/ACT/OBSERVE
    /// rounds. Tool failures never abort the loop; only LLM transport
    /// failures surface as errors.
    pub async fn answer(&self, question: &str) -> Result<AgentAnswer> {
        let mut messages = vec![Message::user(question)];
        let mut usage = Usage::default();
        let mut nudged = false;

        for step in 1..=self.max_steps {
            let request = CompletionRequest::new(&self.system_prompt)
                .with_messages(messages.clone())
                .with_tools(self.router.definitions());

            let response = self.llm.complete(request).await?;
            usage.add(&response.usage);

            if response.tool_calls.is_empty() {
                if response.content.trim().is_empty() {
                    // Neither text nor tool calls; one corrective nudge, then
                    // give up on this question rather than spinning.
                    if nudged {
                        warn!("model returned two empty completions, giving up");
                        return Ok(AgentAnswer {
                            text: fallback_answer(&messages),
                            steps: step,
                            usage,
                        });
                    }
                    nudged = true;
                    messages.push(Message::user(
                        "Your last reply was empty. Answer the question directly, \
                         or call one of the available tools.",
                    ));
                    continue;
                }

                info!("answered after {} step(s), {} tokens", step, usage.total());
                return Ok(AgentAnswer {
                    text: response.content,
                    steps: step,
                    usage,
                });
            }

            let content = if response.content.is_empty() {
                None
            } else {
                Some(response.content.clone())
            };
            messages.push(Message::assistant_with_tool_calls(content, response.tool_calls.clone()));

            for call in &response.tool_calls {
                debug!("dispatching tool {} ({})", call.name, call.id);
                let result = self.router.dispatch(call).await;
                if result.is_error {
                    warn!("tool {} failed: {}", call.name, result.content);
                }
                let observation = if result.is_error {
                    format!("ERROR: {}", result.content)
                } else {
                    result.content
                };
                messages.push(Message::tool_result(&result.tool_call_id, observation));
            }
        }

        warn!("step limit ({}) exhausted", self.max_steps);
        Ok(AgentAnswer {
            text: fallback_answer(&messages),
            steps: self.max_steps,
            usage,
        })
    }
}

/// Compose the system prompt from the router's tool descriptions.
fn build_system_prompt(tools: &[Tool]) -> String {
    let mut lines = vec![
        "You are a medical data assistant. You answer questions using three patient \
         databases (heart disease, cancer prediction, diabetes) and a web search tool."
            .to_string(),
        String::new(),
        "Available tools:".to_string(),
    ];
    for tool in tools {
        lines.push(format!("- {}: {}", tool.name(), tool.description));
    }
    lines.push(String::new());
    lines.push(
        "Use the database tools for questions about patient records, statistics, or \
         numbers, writing a single SQLite SELECT statement per call. Use web search only \
         for general medical knowledge. If a tool returns an error, adjust the query and \
         try again. Finish with a short, direct answer for the user."
            .to_string(),
    );
    lines.join("\n")
}

/// Last non-empty assistant text, or a canned apology when there is none.
fn fallback_answer(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .filter(|m| matches!(m.role, crate::llm::Role::Assistant))
        .find_map(|m| m.content.clone().filter(|c| !c.trim().is_empty()))
        .unwrap_or_else(|| {
            "I could not produce an answer within the step limit. \
             Please try rephrasing the question."
                .to_string()
        })
}
