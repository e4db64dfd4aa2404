//! Tool identities and definitions
//!
//! The agent exposes a fixed set of four tools. Dispatch is keyed by the
//! ToolId enum rather than by matching free-text names, so an unknown or
//! misspelled tool name from the model is caught at one place and turned
//! into a corrective observation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;

/// The fixed tool set: three database tools and one web search tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    HeartDisease,
    Cancer,
    Diabetes,
    WebSearch,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [
        ToolId::HeartDisease,
        ToolId::Cancer,
        ToolId::Diabetes,
        ToolId::WebSearch,
    ];

    /// Wire name exposed to the LLM
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeartDisease => "heart_disease_db",
            Self::Cancer => "cancer_db",
            Self::Diabetes => "diabetes_db",
            Self::WebSearch => "medical_web_search",
        }
    }

    /// Resolve a wire name back to a ToolId
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "heart_disease_db" => Some(Self::HeartDisease),
            "cancer_db" => Some(Self::Cancer),
            "diabetes_db" => Some(Self::Diabetes),
            "medical_web_search" => Some(Self::WebSearch),
            _ => None,
        }
    }

    /// Whether this tool is bound to one of the SQLite databases
    pub fn is_database(&self) -> bool {
        !matches!(self, Self::WebSearch)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON schema shared by all four tools: one free-form query string.
pub fn query_schema(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": description }
        },
        "required": ["query"]
    })
}

/// A concrete tool: identity plus the prompt-facing description and schema.
#[derive(Debug, Clone)]
pub struct Tool {
    pub id: ToolId,
    pub description: String,
    pub parameters: Value,
}

impl Tool {
    /// Build a database-bound tool. The schema summary is interpolated into
    /// the description so the model can write SQL without guessing columns.
    pub fn database(id: ToolId, label: &str, schema_summary: &str) -> Self {
        Self {
            id,
            description: format!(
                "Query the {} patient database for records, statistics, or numbers. \
                 Input must be a single SQLite SELECT statement. Schema: {}",
                label, schema_summary
            ),
            parameters: query_schema("SQLite SELECT statement to run"),
        }
    }

    /// Build the web search tool.
    pub fn web_search() -> Self {
        Self {
            id: ToolId::WebSearch,
            description: "Search the web for general medical knowledge such as symptoms, \
                          causes, treatments, or definitions. NOT for statistics about the \
                          patient databases."
                .to_string(),
            parameters: query_schema("Search query in plain language"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Convert to the LLM-facing tool definition
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description.clone(), self.parameters.clone())
    }
}
