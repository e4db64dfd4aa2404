//! Tool routing and execution
//!
//! Defines the ToolRouter trait and the AgentToolRouter that dispatches on
//! ToolId: database tools run their query against the bound read-only
//! connection, the search tool calls the web provider. Every failure path
//! returns an error ToolResult so the reasoning loop always has text to
//! react to.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::{DbRegistry, MedicalDb};
use crate::llm::{ToolCall, ToolDefinition, ToolResult, validate_tool_input};
use crate::search::TavilyClient;

use super::definition::{Tool, ToolId};

/// Trait for dispatching tool calls from the reasoning loop
#[async_trait]
pub trait ToolRouter: Send + Sync {
    /// Execute a tool call. Never fails hard: bad tools, bad inputs, and
    /// provider errors all come back as error results.
    async fn dispatch(&self, call: &ToolCall) -> ToolResult;

    /// The tools this router exposes
    fn tools(&self) -> &[Tool];

    /// LLM-facing definitions for all exposed tools
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools().iter().map(Tool::definition).collect()
    }
}

/// Production router: three database tools plus web search.
pub struct AgentToolRouter {
    tools: Vec<Tool>,
    heart: Arc<MedicalDb>,
    cancer: Arc<MedicalDb>,
    diabetes: Arc<MedicalDb>,
    search: TavilyClient,
}

impl AgentToolRouter {
    /// Build the router from the opened registry and search client.
    ///
    /// Tool descriptions embed each table's schema summary so the model can
    /// write valid SQL without a discovery round-trip.
    pub fn new(registry: &DbRegistry, search: TavilyClient) -> crate::error::Result<Self> {
        let heart = registry.heart();
        let cancer = registry.cancer();
        let diabetes = registry.diabetes();

        let tools = vec![
            Tool::database(ToolId::HeartDisease, heart.label(), &heart.schema_summary()?),
            Tool::database(ToolId::Cancer, cancer.label(), &cancer.schema_summary()?),
            Tool::database(ToolId::Diabetes, diabetes.label(), &diabetes.schema_summary()?),
            Tool::web_search(),
        ];

        Ok(Self {
            tools,
            heart,
            cancer,
            diabetes,
            search,
        })
    }

    fn tool_for(&self, id: ToolId) -> &Tool {
        self.tools
            .iter()
            .find(|t| t.id == id)
            .expect("router built with all four tools")
    }

    fn extract_query(call: &ToolCall) -> Result<&str, String> {
        call.arguments
            .get("query")
            .and_then(|q| q.as_str())
            .ok_or_else(|| format!("Tool '{}' requires a string 'query' argument", call.name))
    }
}

#[async_trait]
impl ToolRouter for AgentToolRouter {
    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let id = match ToolId::from_name(&call.name) {
            Some(id) => id,
            None => {
                let known: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
                return ToolResult::error(
                    &call.id,
                    format!(
                        "Unknown tool '{}'. Available tools: {}",
                        call.name,
                        known.join(", ")
                    ),
                );
            }
        };

        if let Err(e) = validate_tool_input(call, &self.tool_for(id).definition()) {
            return ToolResult::error(&call.id, e.to_string());
        }

        let query = match Self::extract_query(call) {
            Ok(query) => query,
            Err(message) => return ToolResult::error(&call.id, message),
        };

        let outcome = match id {
            ToolId::HeartDisease => self.heart.execute_query(query),
            ToolId::Cancer => self.cancer.execute_query(query),
            ToolId::Diabetes => self.diabetes.execute_query(query),
            ToolId::WebSearch => self.search.search(query).await,
        };

        match outcome {
            Ok(text) => ToolResult::success(&call.id, text),
            Err(e) => ToolResult::error(&call.id, e.to_string()),
        }
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }
}
