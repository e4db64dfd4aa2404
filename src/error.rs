//! Error types for medagent
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in medagent
#[derive(Debug, Error)]
pub enum MedAgentError {
    /// Source CSV for a dataset does not exist
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// CSV parsing or table-writing failure
    #[error("Loader error: {0}")]
    Loader(String),

    /// SQLite query or connection failure
    #[error("Database error: {0}")]
    Database(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search provider error
    #[error("Search error: {0}")]
    Search(String),

    /// Tool dispatch error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Configuration or environment error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for medagent operations
pub type Result<T> = std::result::Result<T, MedAgentError>;
